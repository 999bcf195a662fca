//! Renderable objects: the rendering protocol, scene composition, and the
//! impostor renderers.

pub use crate::renderable::cylinder_impostor::{CylinderImpostor, CYLINDER_IMPOSTOR_SCALE};
pub use crate::renderable::diamond_lattice::{
    DiamondLatticeImpostor, MAX_CUT_MODE, MAX_UNIT_CELLS_PER_DIMENSION,
};
pub use crate::renderable::impostor::{
    proxy_vertices, FrameMatrices, ImpostorUniforms, ProxyVertex,
};
pub use crate::renderable::model_transformer::ModelTransformer;
pub use crate::renderable::renderable::Renderable;
pub use crate::renderable::scene::Scene;
pub use crate::renderable::sphere_impostor::{SphereImpostor, SPHERE_IMPOSTOR_SCALE};

mod cylinder_impostor;
mod diamond_lattice;
mod impostor;
mod model_transformer;
mod renderable;
mod scene;
mod sphere_impostor;
