//! Sphere rendering without sphere tessellation.
//!
//! The GPU only ever sees a level-0 icosahedron, oversized so it encloses the
//! unit sphere. The fragment shader intersects the eye ray with the true
//! implicit sphere, discards the pixels that miss it, and replaces depth,
//! normal, and texture coordinates with exact per-pixel values.

use std::rc::Rc;

use glamx::{Mat4, Vec3};

use crate::context::Context;
use crate::error::Error;
use crate::procedural::unit_sphere_triangles;
use crate::renderable::impostor::{proxy_vertices, FrameMatrices, ImpostorUniforms, ProxyVertex};
use crate::renderable::Renderable;
use crate::resource::{GpuMesh, ProgramSource, ShaderProgram, Texture, TextureImage};
use crate::world::World;

/// Oversizing applied to the icosahedron proxy. A level-0 icosahedron's
/// inscribed sphere has radius ~0.7947, so anything above 1/0.7947 ≈ 1.2585
/// fully encloses the unit sphere. Tuned together with the fragment shader.
pub const SPHERE_IMPOSTOR_SCALE: f32 = 1.26;

/// A textured unit sphere drawn as an impostor.
pub struct SphereImpostor {
    ctxt: Context,
    world: Rc<World>,
    program: ShaderProgram,
    uniforms: ImpostorUniforms,
    mesh: GpuMesh,
    texture: Texture,
}

impl SphereImpostor {
    /// Compiles the impostor program, uploads the oversized proxy mesh and the
    /// texture.
    ///
    /// Construction is all-or-nothing: a failure releases every GPU resource
    /// created so far before it propagates.
    pub fn new(world: Rc<World>, image: &TextureImage) -> Result<SphereImpostor, Error> {
        let ctxt = Context::get();

        let program = ShaderProgram::new(
            &ctxt,
            &ProgramSource {
                label: "sphere_impostor",
                vertex: include_str!("sphere_impostor.vert"),
                geometry: None,
                fragment: include_str!("sphere_impostor.frag"),
            },
        )?;
        let uniforms = ImpostorUniforms::resolve(&program)?;

        let triangles = unit_sphere_triangles(0)?;
        let vertices = proxy_vertices(&triangles, Vec3::splat(SPHERE_IMPOSTOR_SCALE));

        log::debug!(
            "Sphere impostor proxy: {} triangles, {} vertices.",
            triangles.len(),
            vertices.len()
        );

        let mesh = GpuMesh::new(&ctxt, &vertices, &ProxyVertex::LAYOUT)?;
        let texture = Texture::new(&ctxt, image)?;

        Ok(SphereImpostor {
            ctxt,
            world,
            program,
            uniforms,
            mesh,
            texture,
        })
    }
}

impl Renderable for SphereImpostor {
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
