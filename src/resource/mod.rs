//! GPU resource utilities: shader programs, static meshes, and textures.

pub use crate::resource::gpu_mesh::{GpuMesh, VertexAttribute, VertexLayout};
pub use crate::resource::shader_program::{ProgramSource, ShaderProgram};
pub use crate::resource::texture::{Texture, TextureImage};

mod gpu_mesh;
mod shader_program;
mod texture;
