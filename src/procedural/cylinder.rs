//! Unit cylinder tessellation by radial subdivision.

use glamx::Vec3;

use crate::error::Error;
use crate::procedural::Triangle;

/// Tessellates a cylinder of unit radius and unit half-height around the Z axis
/// (the mantle spans `z ∈ [-1, +1]`).
///
/// The mantle is built from `subdivision_count` quads, each split into two
/// triangles. With `capped`, both end disks are added as triangle fans around
/// their center points, so the capped total is `4 * subdivision_count`
/// triangles. The seam at 0°/360° reuses the slice-0 vertices exactly: no gap,
/// no overlap.
pub fn unit_cylinder_triangles(
    subdivision_count: u32,
    capped: bool,
) -> Result<Vec<Triangle>, Error> {
    if subdivision_count < 3 {
        return Err(Error::InvalidParameter(format!(
            "cylinder subdivision count must be at least 3, got {}",
            subdivision_count
        )));
    }

    let n = subdivision_count as usize;

    // One ring of points, shared by the bottom and top circles.
    let ring: Vec<(f32, f32)> = (0..n)
        .map(|i| {
            let theta = i as f32 / n as f32 * std::f32::consts::TAU;
            (theta.cos(), theta.sin())
        })
        .collect();

    let bottom = |i: usize| Vec3::new(ring[i % n].0, ring[i % n].1, -1.0);
    let top = |i: usize| Vec3::new(ring[i % n].0, ring[i % n].1, 1.0);

    let mut triangles = Vec::with_capacity(if capped { 4 * n } else { 2 * n });

    for i in 0..n {
        triangles.push([bottom(i), bottom(i + 1), top(i + 1)]);
        triangles.push([bottom(i), top(i + 1), top(i)]);
    }

    if capped {
        let top_center = Vec3::new(0.0, 0.0, 1.0);
        let bottom_center = Vec3::new(0.0, 0.0, -1.0);

        for i in 0..n {
            triangles.push([top_center, top(i), top(i + 1)]);
        }
        for i in 0..n {
            triangles.push([bottom_center, bottom(i + 1), bottom(i)]);
        }
    }

    Ok(triangles)
}
