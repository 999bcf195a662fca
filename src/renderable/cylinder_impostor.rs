//! Cylinder rendering without fine tessellation.
//!
//! A six-sided prism, slightly oversized, stands in for the cylinder; the
//! fragment shader intersects the eye ray with the true implicit cylinder
//! (mantle and end caps) and trims the proxy to the exact silhouette.

use std::rc::Rc;

use glamx::{Mat4, Vec3};

use crate::context::Context;
use crate::error::Error;
use crate::procedural::unit_cylinder_triangles;
use crate::renderable::impostor::{proxy_vertices, FrameMatrices, ImpostorUniforms, ProxyVertex};
use crate::renderable::Renderable;
use crate::resource::{GpuMesh, ProgramSource, ShaderProgram, Texture, TextureImage};
use crate::world::World;

/// Radial subdivision of the proxy prism.
const PROXY_SUBDIVISIONS: u32 = 6;

/// Oversizing applied to the proxy prism. A hexagonal prism's inscribed
/// cylinder has radius cos(30°) ≈ 0.866, so the radial factor must exceed
/// 1/0.866 ≈ 1.155; the mantle needs almost no slack along the axis. Tuned
/// together with the fragment shader.
pub const CYLINDER_IMPOSTOR_SCALE: Vec3 = Vec3::new(1.2, 1.2, 1.01);

/// A textured unit cylinder (radius 1, half-height 1, axis Z) drawn as an
/// impostor.
pub struct CylinderImpostor {
    ctxt: Context,
    world: Rc<World>,
    program: ShaderProgram,
    uniforms: ImpostorUniforms,
    mesh: GpuMesh,
    texture: Texture,
}

impl CylinderImpostor {
    /// Compiles the impostor program, uploads the oversized proxy mesh and the
    /// texture.
    ///
    /// Construction is all-or-nothing: a failure releases every GPU resource
    /// created so far before it propagates.
    pub fn new(world: Rc<World>, image: &TextureImage) -> Result<CylinderImpostor, Error> {
        let ctxt = Context::get();

        let program = ShaderProgram::new(
            &ctxt,
            &ProgramSource {
                label: "cylinder_impostor",
                vertex: include_str!("cylinder_impostor.vert"),
                geometry: None,
                fragment: include_str!("cylinder_impostor.frag"),
            },
        )?;
        let uniforms = ImpostorUniforms::resolve(&program)?;

        let triangles = unit_cylinder_triangles(PROXY_SUBDIVISIONS, true)?;
        let vertices = proxy_vertices(&triangles, CYLINDER_IMPOSTOR_SCALE);

        log::debug!(
            "Cylinder impostor proxy: {} triangles, {} vertices.",
            triangles.len(),
            vertices.len()
        );

        let mesh = GpuMesh::new(&ctxt, &vertices, &ProxyVertex::LAYOUT)?;
        let texture = Texture::new(&ctxt, image)?;

        Ok(CylinderImpostor {
            ctxt,
            world,
            program,
            uniforms,
            mesh,
            texture,
        })
    }
}

impl Renderable for CylinderImpostor {
    fn render(&mut self, projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<(), Error> {
        let matrices = FrameMatrices::derive(projection, view, model)?;

        self.program.bind();
        self.uniforms
            .upload(&self.program, &matrices, self.world.impostor_mode());

        self.texture.bind();
        self.mesh.bind();

        self.ctxt.enable_backface_culling();
        self.ctxt.draw_triangles(0, self.mesh.vertex_count() as i32);

        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.program.close();
        self.mesh.close();
        self.texture.close();
        Ok(())
    }
}
