//! Shader program compilation, linking, and checked uniform resolution.

use glamx::Mat4;

use crate::context::{Context, ProgramId, ShaderId, ShaderStage, UniformLocation};
use crate::error::Error;

/// The per-stage sources of a program. The geometry stage is optional.
pub struct ProgramSource<'a> {
    /// Debug label used in logs.
    pub label: &'a str,
    /// Vertex stage source.
    pub vertex: &'a str,
    /// Optional geometry stage source.
    pub geometry: Option<&'a str>,
    /// Fragment stage source.
    pub fragment: &'a str,
}

/// A compiled and linked shader program.
///
/// The program exclusively owns its compiled stage handles and the linked
/// program handle. Construction is all-or-nothing: when any stage fails to
/// compile or the link fails, everything created so far is released before the
/// error propagates.
pub struct ShaderProgram {
    ctxt: Context,
    program: Option<ProgramId>,
    shaders: Vec<ShaderId>,
}

impl ShaderProgram {
    /// Compiles and links a program from `source`.
    pub fn new(ctxt: &Context, source: &ProgramSource) -> Result<ShaderProgram, Error> {
        let program = ctxt.create_program()?;
        let mut result = ShaderProgram {
            ctxt: ctxt.clone(),
            program: Some(program),
            shaders: Vec::with_capacity(3),
        };

        let stages = [
            (ShaderStage::Vertex, Some(source.vertex)),
            (ShaderStage::Geometry, source.geometry),
            (ShaderStage::Fragment, Some(source.fragment)),
        ];

        for (stage, stage_source) in stages.iter() {
            let stage_source = match stage_source {
                Some(stage_source) => stage_source,
                None => continue,
            };

            // On failure, dropping `result` releases everything created so far.
            let shader = ctxt.create_shader(*stage)?;
            result.shaders.push(shader);
            ctxt.compile_shader(shader, stage_source)?;
            ctxt.attach_shader(program, shader);
        }

        ctxt.link_program(program)?;

        log::debug!(
            "Linked shader program `{}` ({} stages).",
            source.label,
            result.shaders.len()
        );

        Ok(result)
    }

    /// Resolves a uniform required by the caller's shading contract.
    ///
    /// A missing uniform is a construction-time failure of the renderer, never a
    /// silent no-op at render time.
    pub fn uniform_location(&self, name: &'static str) -> Result<UniformLocation, Error> {
        let program = match self.program {
            Some(program) => program,
            None => return Err(Error::MissingUniform { name }),
        };

        self.ctxt
            .uniform_location(program, name)
            .ok_or(Error::MissingUniform { name })
    }

    /// Makes this program the active one.
    pub fn bind(&self) {
        if self.program.is_some() {
            self.ctxt.use_program(self.program);
        }
    }

    /// Uploads a matrix uniform of the active program.
    pub fn set_uniform_mat4(&self, location: UniformLocation, value: &Mat4) {
        self.ctxt
            .set_uniform_mat4(location, &value.to_cols_array());
    }

    /// Uploads an unsigned integer uniform of the active program.
    pub fn set_uniform_u32(&self, location: UniformLocation, value: u32) {
        self.ctxt.set_uniform_u32(location, value);
    }

    /// Uploads a float uniform of the active program.
    pub fn set_uniform_f32(&self, location: UniformLocation, value: f32) {
        self.ctxt.set_uniform_f32(location, value);
    }

    /// Releases the program and its compiled stages. Safe to call more than
    /// once; only the first call releases anything.
    pub fn close(&mut self) {
        if let Some(program) = self.program.take() {
            self.ctxt.delete_program(program);
        }

        for shader in self.shaders.drain(..) {
            self.ctxt.delete_shader(shader);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.close();
    }
}
