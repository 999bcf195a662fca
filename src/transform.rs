//! Homogeneous transform constructors and the per-frame projection matrix.
//!
//! All matrices follow the column-vector convention: composing `a * b` applies
//! `b` first, then `a`. Model matrices therefore read left-to-right from the
//! outermost transform down to the leaf, matching the scene-graph nesting order.

use glamx::{Mat4, Vec3};

use crate::error::Error;

/// Returns the translation by `offset`.
pub fn translate(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Returns the rotation of `angle` radians around `axis`.
///
/// The axis does not need to be normalized, but must have a nonzero length.
/// The angle is unbounded: animations accumulate time without wrapping.
pub fn rotate(axis: Vec3, angle: f32) -> Result<Mat4, Error> {
    if !angle.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "rotation angle must be finite, got {}",
            angle
        )));
    }

    match axis.try_normalize() {
        Some(axis) => Ok(Mat4::from_axis_angle(axis, angle)),
        None => Err(Error::InvalidParameter(format!(
            "rotation axis must have a nonzero length, got {:?}",
            axis
        ))),
    }
}

/// Returns the uniform scaling by `factor`.
pub fn scale(factor: f32) -> Mat4 {
    Mat4::from_scale(Vec3::splat(factor))
}

/// Returns the per-axis scaling by `factors`.
pub fn scale_xyz(factors: Vec3) -> Mat4 {
    Mat4::from_scale(factors)
}

/// Returns the perspective projection for a viewport of `width`x`height` pixels.
///
/// `fov_degrees` is the vertical field of view. Fails on an empty viewport, a
/// field of view outside (0, 180), or a degenerate depth range
/// (`near <= 0` or `near >= far`).
pub fn perspective_projection(
    width: u32,
    height: u32,
    fov_degrees: f32,
    near: f32,
    far: f32,
) -> Result<Mat4, Error> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter(format!(
            "viewport must not be empty, got {}x{}",
            width, height
        )));
    }

    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        return Err(Error::InvalidParameter(format!(
            "vertical field of view must lie in (0, 180) degrees, got {}",
            fov_degrees
        )));
    }

    if !(near > 0.0 && near < far && far.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "depth range must satisfy 0 < near < far, got near={} far={}",
            near, far
        )));
    }

    let aspect = width as f32 / height as f32;

    Ok(Mat4::perspective_rh_gl(
        fov_degrees.to_radians(),
        aspect,
        near,
        far,
    ))
}

/// Applies `matrix` to every vertex, with perspective division.
pub fn apply_transform_to_vertices(matrix: &Mat4, vertices: &[Vec3]) -> Vec<Vec3> {
    vertices
        .iter()
        .map(|&v| matrix.project_point3(v))
        .collect()
}
