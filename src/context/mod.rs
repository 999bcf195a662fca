//! Graphics-API abstraction: the back-end trait, typed resource ids, and the
//! thread-local context singleton.

pub use crate::context::context::{
    BufferId, Context, GraphicsBackend, ProgramId, ShaderId, ShaderStage, TextureId,
    UniformLocation, VertexArrayId,
};
pub use crate::context::glow_backend::GlowBackend;

mod context;
mod glow_backend;
