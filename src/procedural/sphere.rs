//! Unit sphere tessellation by recursive icosahedron subdivision.

use glamx::Vec3;

use crate::error::Error;
use crate::procedural::Triangle;

/// Highest supported subdivision level. Level 8 already yields 1 310 720
/// triangles; going further is never useful for a proxy mesh.
pub const MAX_SPHERE_RECURSION_LEVEL: u32 = 8;

/// Tessellates the unit sphere, starting from a regular icosahedron.
///
/// Level 0 is the icosahedron itself (20 triangles); every level bisects each
/// edge and pushes the midpoints back onto the unit sphere, quadrupling the
/// triangle count. The output ordering is deterministic for a given level.
pub fn unit_sphere_triangles(recursion_level: u32) -> Result<Vec<Triangle>, Error> {
    if recursion_level > MAX_SPHERE_RECURSION_LEVEL {
        return Err(Error::InvalidParameter(format!(
            "sphere recursion level must be at most {}, got {}",
            MAX_SPHERE_RECURSION_LEVEL, recursion_level
        )));
    }

    let mut triangles = icosahedron_triangles();

    for _ in 0..recursion_level {
        let mut subdivided = Vec::with_capacity(triangles.len() * 4);

        for [a, b, c] in triangles {
            let ab = (a + b).normalize();
            let bc = (b + c).normalize();
            let ca = (c + a).normalize();

            subdivided.push([a, ab, ca]);
            subdivided.push([b, bc, ab]);
            subdivided.push([c, ca, bc]);
            subdivided.push([ab, bc, ca]);
        }

        triangles = subdivided;
    }

    Ok(triangles)
}

/// The twelve vertices of a regular icosahedron sit on three mutually
/// orthogonal golden rectangles.
fn icosahedron_triangles() -> Vec<Triangle> {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;

    let vertices = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];

    // Counterclockwise seen from outside.
    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    FACES
        .iter()
        .map(|&[a, b, c]| {
            [
                vertices[a].normalize(),
                vertices[b].normalize(),
                vertices[c].normalize(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_count_quadruples_per_level() {
        for level in 0..=3 {
            let triangles = unit_sphere_triangles(level).unwrap();
            assert_eq!(triangles.len(), 20 * 4usize.pow(level));
        }
    }

    #[test]
    fn all_vertices_lie_on_the_unit_sphere() {
        for level in 0..=3 {
            for triangle in unit_sphere_triangles(level).unwrap() {
                for vertex in &triangle {
                    assert!((vertex.length() - 1.0).abs() < 1.0e-6);
                }
            }
        }
    }

    #[test]
    fn output_is_deterministic() {
        let first = unit_sphere_triangles(2).unwrap();
        let second = unit_sphere_triangles(2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn winding_faces_outward() {
        for [a, b, c] in unit_sphere_triangles(1).unwrap() {
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn rejects_excessive_recursion() {
        assert!(matches!(
            unit_sphere_triangles(MAX_SPHERE_RECURSION_LEVEL + 1),
            Err(Error::InvalidParameter(_))
        ));
    }
}
