//! Rendering context management.
//!
//! This module provides a global graphics context that can be initialized and
//! reset across window recreations, together with the [`GraphicsBackend`] trait
//! describing the exact operations the renderables need from the graphics API.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Error;

// The global context singleton.
// We use RefCell<Option<>> instead of OnceLock to allow resetting the context
// when recreating a window, or swapping in an instrumented back-end in tests.
thread_local! {
    static CONTEXT_SINGLETON: RefCell<Option<Context>> = RefCell::new(None);
}

/// A shader stage of a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Per-vertex stage.
    Vertex,
    /// Optional primitive-expansion stage.
    Geometry,
    /// Per-fragment stage.
    Fragment,
}

impl ShaderStage {
    /// A human-readable stage name, for logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        }
    }
}

macro_rules! resource_id {
    ($(#[$doc: meta])* $name: ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    }
}

resource_id!(
    /// Identifies a buffer owned by the back-end.
    BufferId
);
resource_id!(
    /// Identifies a vertex-array binding owned by the back-end.
    VertexArrayId
);
resource_id!(
    /// Identifies a texture owned by the back-end.
    TextureId
);
resource_id!(
    /// Identifies a compiled shader stage owned by the back-end.
    ShaderId
);
resource_id!(
    /// Identifies a linked shader program owned by the back-end.
    ProgramId
);
resource_id!(
    /// Identifies a resolved uniform of a linked program.
    UniformLocation
);

/// Operations the renderables need from the graphics back-end.
///
/// The production implementation is [`GlowBackend`](crate::context::GlowBackend),
/// backed by OpenGL through `glow`. Tests substitute resource-accounting fakes to
/// verify the create/release discipline without a GPU.
///
/// The back-end is stateful the way OpenGL is: uploads and parameters apply to
/// the currently bound object of each kind.
pub trait GraphicsBackend {
    /// Creates a new buffer.
    fn create_buffer(&self) -> Result<BufferId, Error>;
    /// Binds `buffer` as the active array buffer, or unbinds with `None`.
    fn bind_array_buffer(&self, buffer: Option<BufferId>);
    /// Uploads `data` to the bound array buffer as immutable (upload-once) storage.
    fn array_buffer_data(&self, data: &[u8]);
    /// Deletes a buffer.
    fn delete_buffer(&self, buffer: BufferId);

    /// Creates a new vertex-array binding.
    fn create_vertex_array(&self) -> Result<VertexArrayId, Error>;
    /// Binds `vertex_array`, or unbinds with `None`.
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);
    /// Deletes a vertex-array binding.
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);
    /// Declares float attribute `index` of the bound vertex array as reading
    /// `components` floats at `offset`/`stride` (bytes) from the bound array
    /// buffer, advancing once per vertex (`divisor == 0`) or once every
    /// `divisor` instances.
    fn vertex_attrib_f32(&self, index: u32, components: i32, stride: i32, offset: i32, divisor: u32);

    /// Creates a new texture.
    fn create_texture(&self) -> Result<TextureId, Error>;
    /// Binds `texture`, or unbinds with `None`.
    fn bind_texture(&self, texture: Option<TextureId>);
    /// Uploads tightly-packed RGB8 pixels to the bound texture and configures
    /// repeat wrapping with linear filtering.
    fn texture_image_rgb8(&self, width: u32, height: u32, pixels: &[u8]);
    /// Generates the mipmap chain of the bound texture.
    fn generate_mipmaps(&self);
    /// Deletes a texture.
    fn delete_texture(&self, texture: TextureId);

    /// Creates an empty shader object for `stage`.
    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, Error>;
    /// Compiles `source` into `shader`. A compilation failure carries the
    /// back-end's info log.
    fn compile_shader(&self, shader: ShaderId, source: &str) -> Result<(), Error>;
    /// Deletes a shader object.
    fn delete_shader(&self, shader: ShaderId);
    /// Creates an empty program object.
    fn create_program(&self) -> Result<ProgramId, Error>;
    /// Attaches a compiled shader to a program.
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Links the program from its attached stages.
    fn link_program(&self, program: ProgramId) -> Result<(), Error>;
    /// Makes `program` the active one, or deactivates with `None`.
    fn use_program(&self, program: Option<ProgramId>);
    /// Deletes a program object.
    fn delete_program(&self, program: ProgramId);
    /// Resolves a uniform by name. `None` if the linked program has no active
    /// uniform with this name.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Uploads a column-major 4x4 matrix to `location` of the active program.
    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]);
    /// Uploads an unsigned integer to `location` of the active program.
    fn set_uniform_u32(&self, location: UniformLocation, value: u32);
    /// Uploads a float to `location` of the active program.
    fn set_uniform_f32(&self, location: UniformLocation, value: f32);

    /// Enables back-face culling.
    fn enable_backface_culling(&self);
    /// Draws `count` vertices of the bound vertex array as triangles.
    fn draw_triangles(&self, first: i32, count: i32);
    /// Draws `count` vertices of the bound vertex array as triangles, repeated
    /// for `instances` instances.
    fn draw_triangles_instanced(&self, first: i32, count: i32, instances: i32);
}

/// The rendering context shared by every renderable.
///
/// This is a cheaply-clonable handle to the installed [`GraphicsBackend`]; all
/// clones refer to the same back-end.
#[derive(Clone)]
pub struct Context {
    backend: Rc<dyn GraphicsBackend>,
}

impl Context {
    /// Initializes or reinitializes the global context with the given back-end.
    ///
    /// Called once the graphics API is reachable (after window and GL context
    /// creation). Installing a new back-end replaces the previous one.
    pub fn init(backend: Rc<dyn GraphicsBackend>) {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = Some(Context { backend });
        });
    }

    /// Gets a clone of the global context.
    ///
    /// # Panics
    /// Panics if the context has not been initialized via `init()`.
    pub fn get() -> Context {
        CONTEXT_SINGLETON.with(|cell| {
            cell.borrow()
                .as_ref()
                .expect("graphics context not initialized. Call Context::init() first.")
                .clone()
        })
    }

    /// Checks if the context has been initialized.
    pub fn is_initialized() -> bool {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().is_some())
    }

    /// Resets the global context, releasing this thread's handle to the back-end.
    ///
    /// After calling this, `is_initialized()` returns `false` and `get()` panics
    /// until `init()` is called again.
    pub fn reset() {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = None;
        });
    }

    /// Creates a new buffer.
    pub fn create_buffer(&self) -> Result<BufferId, Error> {
        self.backend.create_buffer()
    }

    /// Binds a buffer as the active array buffer.
    pub fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        self.backend.bind_array_buffer(buffer)
    }

    /// Uploads immutable vertex data to the bound array buffer.
    pub fn array_buffer_data(&self, data: &[u8]) {
        self.backend.array_buffer_data(data)
    }

    /// Deletes a buffer.
    pub fn delete_buffer(&self, buffer: BufferId) {
        self.backend.delete_buffer(buffer)
    }

    /// Creates a new vertex-array binding.
    pub fn create_vertex_array(&self) -> Result<VertexArrayId, Error> {
        self.backend.create_vertex_array()
    }

    /// Binds a vertex array.
    pub fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        self.backend.bind_vertex_array(vertex_array)
    }

    /// Deletes a vertex-array binding.
    pub fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        self.backend.delete_vertex_array(vertex_array)
    }

    /// Declares a float attribute of the bound vertex array.
    pub fn vertex_attrib_f32(
        &self,
        index: u32,
        components: i32,
        stride: i32,
        offset: i32,
        divisor: u32,
    ) {
        self.backend
            .vertex_attrib_f32(index, components, stride, offset, divisor)
    }

    /// Creates a new texture.
    pub fn create_texture(&self) -> Result<TextureId, Error> {
        self.backend.create_texture()
    }

    /// Binds a texture.
    pub fn bind_texture(&self, texture: Option<TextureId>) {
        self.backend.bind_texture(texture)
    }

    /// Uploads RGB8 pixels to the bound texture.
    pub fn texture_image_rgb8(&self, width: u32, height: u32, pixels: &[u8]) {
        self.backend.texture_image_rgb8(width, height, pixels)
    }

    /// Generates the mipmap chain of the bound texture.
    pub fn generate_mipmaps(&self) {
        self.backend.generate_mipmaps()
    }

    /// Deletes a texture.
    pub fn delete_texture(&self, texture: TextureId) {
        self.backend.delete_texture(texture)
    }

    /// Creates an empty shader object.
    pub fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, Error> {
        self.backend.create_shader(stage)
    }

    /// Compiles shader source into a shader object.
    pub fn compile_shader(&self, shader: ShaderId, source: &str) -> Result<(), Error> {
        self.backend.compile_shader(shader, source)
    }

    /// Deletes a shader object.
    pub fn delete_shader(&self, shader: ShaderId) {
        self.backend.delete_shader(shader)
    }

    /// Creates an empty program object.
    pub fn create_program(&self) -> Result<ProgramId, Error> {
        self.backend.create_program()
    }

    /// Attaches a compiled shader to a program.
    pub fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.backend.attach_shader(program, shader)
    }

    /// Links a program from its attached stages.
    pub fn link_program(&self, program: ProgramId) -> Result<(), Error> {
        self.backend.link_program(program)
    }

    /// Activates a program.
    pub fn use_program(&self, program: Option<ProgramId>) {
        self.backend.use_program(program)
    }

    /// Deletes a program object.
    pub fn delete_program(&self, program: ProgramId) {
        self.backend.delete_program(program)
    }

    /// Resolves a uniform of a linked program by name.
    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.backend.uniform_location(program, name)
    }

    /// Uploads a column-major 4x4 matrix uniform.
    pub fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        self.backend.set_uniform_mat4(location, value)
    }

    /// Uploads an unsigned integer uniform.
    pub fn set_uniform_u32(&self, location: UniformLocation, value: u32) {
        self.backend.set_uniform_u32(location, value)
    }

    /// Uploads a float uniform.
    pub fn set_uniform_f32(&self, location: UniformLocation, value: f32) {
        self.backend.set_uniform_f32(location, value)
    }

    /// Enables back-face culling.
    pub fn enable_backface_culling(&self) {
        self.backend.enable_backface_culling()
    }

    /// Draws triangles from the bound vertex array.
    pub fn draw_triangles(&self, first: i32, count: i32) {
        self.backend.draw_triangles(first, count)
    }

    /// Draws instanced triangles from the bound vertex array.
    pub fn draw_triangles_instanced(&self, first: i32, count: i32, instances: i32) {
        self.backend.draw_triangles_instanced(first, count, instances)
    }
}
