//! Test doubles shared by the unit tests: a resource-accounting graphics
//! back-end that can be told to fail at specific points.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::context::{
    BufferId, Context, GraphicsBackend, ProgramId, ShaderId, ShaderStage, TextureId,
    UniformLocation, VertexArrayId,
};
use crate::error::Error;

/// A [`GraphicsBackend`] that allocates nothing and counts everything.
///
/// Every create/delete pair is tracked per resource kind, so a test can assert
/// that a failed construction or a close left zero live handles behind. The
/// failure switches make compilation, linking, or uniform resolution fail on
/// demand.
#[derive(Default)]
pub struct CountingBackend {
    next_id: Cell<u32>,
    live_buffers: RefCell<HashSet<u32>>,
    live_vertex_arrays: RefCell<HashSet<u32>>,
    live_textures: RefCell<HashSet<u32>>,
    live_shaders: RefCell<HashMap<u32, ShaderStage>>,
    live_programs: RefCell<HashSet<u32>>,
    draw_calls: Cell<u32>,

    /// Make compilation of this stage fail.
    pub fail_compile_stage: Cell<Option<ShaderStage>>,
    /// Make program linking fail.
    pub fail_link: Cell<bool>,
    /// Make resolution of this uniform name fail.
    pub missing_uniform: RefCell<Option<&'static str>>,
}

impl CountingBackend {
    pub fn new() -> CountingBackend {
        CountingBackend::default()
    }

    /// Creates a counting back-end and installs it as the global context.
    pub fn install() -> Rc<CountingBackend> {
        let backend = Rc::new(CountingBackend::new());
        Context::init(backend.clone());
        backend
    }

    fn fresh_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// Total number of live GPU handles of every kind.
    pub fn live_total(&self) -> usize {
        self.live_buffers.borrow().len()
            + self.live_vertex_arrays.borrow().len()
            + self.live_textures.borrow().len()
            + self.live_shaders.borrow().len()
            + self.live_programs.borrow().len()
    }

    /// Number of draw calls issued so far.
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls.get()
    }
}

impl GraphicsBackend for CountingBackend {
    fn create_buffer(&self) -> Result<BufferId, Error> {
        let id = self.fresh_id();
        self.live_buffers.borrow_mut().insert(id);
        Ok(BufferId(id))
    }

    fn bind_array_buffer(&self, _buffer: Option<BufferId>) {}

    fn array_buffer_data(&self, _data: &[u8]) {}

    fn delete_buffer(&self, buffer: BufferId) {
        assert!(
            self.live_buffers.borrow_mut().remove(&buffer.0),
            "double delete of buffer {:?}",
            buffer
        );
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, Error> {
        let id = self.fresh_id();
        self.live_vertex_arrays.borrow_mut().insert(id);
        Ok(VertexArrayId(id))
    }

    fn bind_vertex_array(&self, _vertex_array: Option<VertexArrayId>) {}

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        assert!(
            self.live_vertex_arrays.borrow_mut().remove(&vertex_array.0),
            "double delete of vertex array {:?}",
            vertex_array
        );
    }

    fn vertex_attrib_f32(
        &self,
        _index: u32,
        _components: i32,
        _stride: i32,
        _offset: i32,
        _divisor: u32,
    ) {
    }

    fn create_texture(&self) -> Result<TextureId, Error> {
        let id = self.fresh_id();
        self.live_textures.borrow_mut().insert(id);
        Ok(TextureId(id))
    }

    fn bind_texture(&self, _texture: Option<TextureId>) {}

    fn texture_image_rgb8(&self, _width: u32, _height: u32, _pixels: &[u8]) {}

    fn generate_mipmaps(&self) {}

    fn delete_texture(&self, texture: TextureId) {
        assert!(
            self.live_textures.borrow_mut().remove(&texture.0),
            "double delete of texture {:?}",
            texture
        );
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, Error> {
        let id = self.fresh_id();
        self.live_shaders.borrow_mut().insert(id, stage);
        Ok(ShaderId(id))
    }

    fn compile_shader(&self, shader: ShaderId, _source: &str) -> Result<(), Error> {
        let stage = self.live_shaders.borrow()[&shader.0];

        if self.fail_compile_stage.get() == Some(stage) {
            return Err(Error::ShaderCompilation {
                stage,
                log: "induced compile failure".to_string(),
            });
        }

        Ok(())
    }

    fn delete_shader(&self, shader: ShaderId) {
        assert!(
            self.live_shaders.borrow_mut().remove(&shader.0).is_some(),
            "double delete of shader {:?}",
            shader
        );
    }

    fn create_program(&self) -> Result<ProgramId, Error> {
        let id = self.fresh_id();
        self.live_programs.borrow_mut().insert(id);
        Ok(ProgramId(id))
    }

    fn attach_shader(&self, _program: ProgramId, _shader: ShaderId) {}

    fn link_program(&self, _program: ProgramId) -> Result<(), Error> {
        if self.fail_link.get() {
            return Err(Error::ProgramLink {
                log: "induced link failure".to_string(),
            });
        }

        Ok(())
    }

    fn use_program(&self, _program: Option<ProgramId>) {}

    fn delete_program(&self, program: ProgramId) {
        assert!(
            self.live_programs.borrow_mut().remove(&program.0),
            "double delete of program {:?}",
            program
        );
    }

    fn uniform_location(&self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        if self.missing_uniform.borrow().map_or(false, |missing| missing == name) {
            return None;
        }

        Some(UniformLocation(self.fresh_id()))
    }

    fn set_uniform_mat4(&self, _location: UniformLocation, _value: &[f32; 16]) {}

    fn set_uniform_u32(&self, _location: UniformLocation, _value: u32) {}

    fn set_uniform_f32(&self, _location: UniformLocation, _value: f32) {}

    fn enable_backface_culling(&self) {}

    fn draw_triangles(&self, _first: i32, count: i32) {
        assert!(count > 0, "empty draw");
        self.draw_calls.set(self.draw_calls.get() + 1);
    }

    fn draw_triangles_instanced(&self, _first: i32, count: i32, instances: i32) {
        assert!(count > 0, "empty draw");
        assert!(instances >= 0, "negative instance count");
        self.draw_calls.set(self.draw_calls.get() + 1);
    }
}
