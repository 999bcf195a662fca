//! Plumbing shared by all impostor renderers: the proxy vertex record, the
//! uniform contract, and the per-frame matrix derivation.

use bytemuck::{Pod, Zeroable};
use glamx::{Mat4, Vec3};

use crate::context::UniformLocation;
use crate::error::Error;
use crate::procedural::Triangle;
use crate::resource::{ShaderProgram, VertexAttribute, VertexLayout};
use crate::transform;
use crate::world::ImpostorMode;

/// Vertex record of the proxy meshes: a bare position.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ProxyVertex {
    /// Position in the proxy's local coordinates.
    pub position: [f32; 3],
}

impl ProxyVertex {
    /// Field layout matching the `a_vertex` shader input.
    pub const LAYOUT: VertexLayout = VertexLayout {
        attributes: &[VertexAttribute {
            name: "a_vertex",
            components: 3,
        }],
    };
}

/// Flattens `triangles` into a vertex array, oversized by `oversize` so the
/// proxy fully encloses the implicit surface it stands in for.
pub fn proxy_vertices(triangles: &[Triangle], oversize: Vec3) -> Vec<ProxyVertex> {
    let oversize = transform::scale_xyz(oversize);

    triangles
        .iter()
        .flatten()
        .map(|&vertex| ProxyVertex {
            position: oversize.transform_point3(vertex).to_array(),
        })
        .collect()
}

/// The matrices uploaded by every impostor renderer each frame.
///
/// The transposed inverses are part of the contract because surface normals
/// transform by the inverse-transpose under non-uniform model transforms;
/// using the plain matrices would shear the normals off perpendicularity.
pub struct FrameMatrices {
    /// Camera projection.
    pub projection: Mat4,
    /// View times model.
    pub view_model: Mat4,
    /// Projection times view times model.
    pub projection_view_model: Mat4,
    /// Inverse-transpose of the view matrix.
    pub transposed_inverse_view: Mat4,
    /// Inverse-transpose of view times model.
    pub transposed_inverse_view_model: Mat4,
}

impl FrameMatrices {
    /// Derives the full matrix set for one draw.
    ///
    /// Fails with [`Error::DegenerateTransform`] when the view or view·model
    /// matrix is singular; the caller skips the draw for this frame.
    pub fn derive(projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<FrameMatrices, Error> {
        let view_model = *view * *model;

        Ok(FrameMatrices {
            projection: *projection,
            view_model,
            projection_view_model: *projection * view_model,
            transposed_inverse_view: checked_inverse(view, "view")?.transpose(),
            transposed_inverse_view_model: checked_inverse(&view_model, "view-model")?.transpose(),
        })
    }
}

fn checked_inverse(matrix: &Mat4, what: &'static str) -> Result<Mat4, Error> {
    let determinant = matrix.determinant();

    if !determinant.is_finite() || determinant.abs() < 1.0e-12 {
        return Err(Error::DegenerateTransform(what));
    }

    Ok(matrix.inverse())
}

/// The uniform-location table of the impostor shading contract, resolved once
/// at renderer construction.
pub struct ImpostorUniforms {
    projection_matrix: UniformLocation,
    view_model_matrix: UniformLocation,
    projection_view_model_matrix: UniformLocation,
    transposed_inverse_view_matrix: UniformLocation,
    transposed_inverse_view_model_matrix: UniformLocation,
    impostor_mode: UniformLocation,
}

impl ImpostorUniforms {
    /// Resolves the whole table. Any missing uniform fails the renderer's
    /// construction.
    pub fn resolve(program: &ShaderProgram) -> Result<ImpostorUniforms, Error> {
        Ok(ImpostorUniforms {
            projection_matrix: program.uniform_location("projection_matrix")?,
            view_model_matrix: program.uniform_location("view_model_matrix")?,
            projection_view_model_matrix: program
                .uniform_location("projection_view_model_matrix")?,
            transposed_inverse_view_matrix: program
                .uniform_location("transposed_inverse_view_matrix")?,
            transposed_inverse_view_model_matrix: program
                .uniform_location("transposed_inverse_view_model_matrix")?,
            impostor_mode: program.uniform_location("impostor_mode")?,
        })
    }

    /// Uploads the matrix set and the live shading mode. The program must be
    /// bound.
    pub fn upload(&self, program: &ShaderProgram, matrices: &FrameMatrices, mode: ImpostorMode) {
        program.set_uniform_mat4(self.projection_matrix, &matrices.projection);
        program.set_uniform_mat4(self.view_model_matrix, &matrices.view_model);
        program.set_uniform_mat4(
            self.projection_view_model_matrix,
            &matrices.projection_view_model,
        );
        program.set_uniform_mat4(
            self.transposed_inverse_view_matrix,
            &matrices.transposed_inverse_view,
        );
        program.set_uniform_mat4(
            self.transposed_inverse_view_model_matrix,
            &matrices.transposed_inverse_view_model,
        );
        program.set_uniform_u32(self.impostor_mode, mode.as_uniform());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_rejects_singular_view() {
        let squashed = transform::scale_xyz(Vec3::new(1.0, 0.0, 1.0));

        let result = FrameMatrices::derive(&Mat4::IDENTITY, &squashed, &Mat4::IDENTITY);

        assert!(matches!(result, Err(Error::DegenerateTransform("view"))));
    }

    #[test]
    fn derive_rejects_singular_view_model() {
        let squashed = transform::scale_xyz(Vec3::new(1.0, 1.0, 0.0));

        let result = FrameMatrices::derive(&Mat4::IDENTITY, &Mat4::IDENTITY, &squashed);

        assert!(matches!(
            result,
            Err(Error::DegenerateTransform("view-model"))
        ));
    }

    #[test]
    fn transposed_inverse_restores_normal_perpendicularity() {
        // Non-uniform scale: a naive transform would bend this normal away
        // from the surface.
        let model = transform::scale_xyz(Vec3::new(2.0, 1.0, 1.0));
        let matrices = FrameMatrices::derive(&Mat4::IDENTITY, &Mat4::IDENTITY, &model).unwrap();

        // Plane x + y = 1 has normal (1, 1, 0) and tangent (-1, 1, 0).
        let tangent = Vec3::new(-1.0, 1.0, 0.0);
        let normal = Vec3::new(1.0, 1.0, 0.0);

        let mapped_tangent = model.transform_vector3(tangent);
        let mapped_normal = matrices
            .transposed_inverse_view_model
            .transform_vector3(normal);

        assert!(mapped_normal.dot(mapped_tangent).abs() < 1.0e-5);
        // The plain matrix does not preserve perpendicularity here.
        assert!(model.transform_vector3(normal).dot(mapped_tangent).abs() > 1.0e-2);
    }
}
