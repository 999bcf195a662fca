//! The production [`GraphicsBackend`] over the `glow` OpenGL bindings.
//!
//! The owner of the windowing layer creates the `glow::Context` (from whatever
//! loader the platform provides) and installs it with:
//!
//! ```ignore
//! Context::init(Rc::new(GlowBackend::new(gl)));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use glow::HasContext;

use crate::context::context::{
    BufferId, GraphicsBackend, ProgramId, ShaderId, ShaderStage, TextureId, UniformLocation,
    VertexArrayId,
};
use crate::error::Error;

type GlBuffer = <glow::Context as HasContext>::Buffer;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;
type GlTexture = <glow::Context as HasContext>::Texture;
type GlShader = <glow::Context as HasContext>::Shader;
type GlProgram = <glow::Context as HasContext>::Program;
type GlUniformLocation = <glow::Context as HasContext>::UniformLocation;

/// Maps the crate's plain resource ids to the native handles `glow` hands out.
struct HandleStore<T> {
    next_id: u32,
    live: HashMap<u32, T>,
}

impl<T: Clone> HandleStore<T> {
    fn new() -> HandleStore<T> {
        HandleStore {
            next_id: 1,
            live: HashMap::new(),
        }
    }

    fn insert(&mut self, handle: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, handle);
        id
    }

    fn get(&self, id: u32) -> Option<T> {
        self.live.get(&id).cloned()
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        self.live.remove(&id)
    }
}

fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

/// OpenGL back-end.
///
/// Must only be used on the thread owning the GL context, which matches the
/// single-threaded rendering model of the whole crate.
pub struct GlowBackend {
    gl: glow::Context,
    buffers: RefCell<HandleStore<GlBuffer>>,
    vertex_arrays: RefCell<HandleStore<GlVertexArray>>,
    textures: RefCell<HandleStore<GlTexture>>,
    shaders: RefCell<HandleStore<(GlShader, ShaderStage)>>,
    programs: RefCell<HandleStore<GlProgram>>,
    uniforms: RefCell<HandleStore<GlUniformLocation>>,
}

impl GlowBackend {
    /// Wraps an already-current `glow::Context`.
    pub fn new(gl: glow::Context) -> GlowBackend {
        GlowBackend {
            gl,
            buffers: RefCell::new(HandleStore::new()),
            vertex_arrays: RefCell::new(HandleStore::new()),
            textures: RefCell::new(HandleStore::new()),
            shaders: RefCell::new(HandleStore::new()),
            programs: RefCell::new(HandleStore::new()),
            uniforms: RefCell::new(HandleStore::new()),
        }
    }
}

impl GraphicsBackend for GlowBackend {
    fn create_buffer(&self) -> Result<BufferId, Error> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(Error::Backend)?;
        Ok(BufferId(self.buffers.borrow_mut().insert(buffer)))
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        let native = buffer.and_then(|b| self.buffers.borrow().get(b.0));
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, native) }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        if let Some(native) = self.buffers.borrow_mut().remove(buffer.0) {
            unsafe { self.gl.delete_buffer(native) }
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, Error> {
        let vao = unsafe { self.gl.create_vertex_array() }.map_err(Error::Backend)?;
        Ok(VertexArrayId(self.vertex_arrays.borrow_mut().insert(vao)))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        let native = vertex_array.and_then(|v| self.vertex_arrays.borrow().get(v.0));
        unsafe { self.gl.bind_vertex_array(native) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        if let Some(native) = self.vertex_arrays.borrow_mut().remove(vertex_array.0) {
            unsafe { self.gl.delete_vertex_array(native) }
        }
    }

    fn vertex_attrib_f32(
        &self,
        index: u32,
        components: i32,
        stride: i32,
        offset: i32,
        divisor: u32,
    ) {
        unsafe {
            self.gl.enable_vertex_attrib_array(index);
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset);
            if divisor != 0 {
                self.gl.vertex_attrib_divisor(index, divisor);
            }
        }
    }

    fn create_texture(&self) -> Result<TextureId, Error> {
        let texture = unsafe { self.gl.create_texture() }.map_err(Error::Backend)?;
        Ok(TextureId(self.textures.borrow_mut().insert(texture)))
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        let native = texture.and_then(|t| self.textures.borrow().get(t.0));
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, native) }
    }

    fn texture_image_rgb8(&self, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            // RGB rows are not 4-byte aligned for arbitrary widths.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmaps(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: TextureId) {
        if let Some(native) = self.textures.borrow_mut().remove(texture.0) {
            unsafe { self.gl.delete_texture(native) }
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, Error> {
        let shader = unsafe { self.gl.create_shader(gl_stage(stage)) }.map_err(Error::Backend)?;
        Ok(ShaderId(self.shaders.borrow_mut().insert((shader, stage))))
    }

    fn compile_shader(&self, shader: ShaderId, source: &str) -> Result<(), Error> {
        let (native, stage) = match self.shaders.borrow().get(shader.0) {
            Some(entry) => entry,
            None => return Err(Error::Backend(format!("unknown shader id {:?}", shader))),
        };

        unsafe {
            self.gl.shader_source(native, source);
            self.gl.compile_shader(native);

            if self.gl.get_shader_compile_status(native) {
                Ok(())
            } else {
                Err(Error::ShaderCompilation {
                    stage,
                    log: self.gl.get_shader_info_log(native),
                })
            }
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        if let Some((native, _)) = self.shaders.borrow_mut().remove(shader.0) {
            unsafe { self.gl.delete_shader(native) }
        }
    }

    fn create_program(&self) -> Result<ProgramId, Error> {
        let program = unsafe { self.gl.create_program() }.map_err(Error::Backend)?;
        Ok(ProgramId(self.programs.borrow_mut().insert(program)))
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let program = self.programs.borrow().get(program.0);
        let shader = self.shaders.borrow().get(shader.0);

        if let (Some(program), Some((shader, _))) = (program, shader) {
            unsafe { self.gl.attach_shader(program, shader) }
        }
    }

    fn link_program(&self, program: ProgramId) -> Result<(), Error> {
        let native = match self.programs.borrow().get(program.0) {
            Some(native) => native,
            None => return Err(Error::Backend(format!("unknown program id {:?}", program))),
        };

        unsafe {
            self.gl.link_program(native);

            if self.gl.get_program_link_status(native) {
                Ok(())
            } else {
                Err(Error::ProgramLink {
                    log: self.gl.get_program_info_log(native),
                })
            }
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let native = program.and_then(|p| self.programs.borrow().get(p.0));
        unsafe { self.gl.use_program(native) }
    }

    fn delete_program(&self, program: ProgramId) {
        if let Some(native) = self.programs.borrow_mut().remove(program.0) {
            unsafe { self.gl.delete_program(native) }
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let native = self.programs.borrow().get(program.0)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        Some(UniformLocation(self.uniforms.borrow_mut().insert(location)))
    }

    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        if let Some(native) = self.uniforms.borrow().get(location.0) {
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&native), false, value)
            }
        }
    }

    fn set_uniform_u32(&self, location: UniformLocation, value: u32) {
        if let Some(native) = self.uniforms.borrow().get(location.0) {
            unsafe { self.gl.uniform_1_u32(Some(&native), value) }
        }
    }

    fn set_uniform_f32(&self, location: UniformLocation, value: f32) {
        if let Some(native) = self.uniforms.borrow().get(location.0) {
            unsafe { self.gl.uniform_1_f32(Some(&native), value) }
        }
    }

    fn enable_backface_culling(&self) {
        unsafe {
            self.gl.enable(glow::CULL_FACE);
            self.gl.cull_face(glow::BACK);
        }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }

    fn draw_triangles_instanced(&self, first: i32, count: i32, instances: i32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(glow::TRIANGLES, first, count, instances)
        }
    }
}
