//! Procedural triangle-soup generators for the impostor proxy shapes.

pub use crate::procedural::cylinder::unit_cylinder_triangles;
pub use crate::procedural::sphere::{unit_sphere_triangles, MAX_SPHERE_RECURSION_LEVEL};

mod cylinder;
mod sphere;

use glamx::Vec3;

/// A single triangle; vertex order defines the winding (counterclockwise seen
/// from outside the shape).
pub type Triangle = [Vec3; 3];
