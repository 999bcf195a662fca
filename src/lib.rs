/*!
# lattice3d

An interactive-viewer core that draws procedurally-generated spheres,
cylinders, and diamond crystal lattices as *impostors*: the GPU only ever sees
coarse, slightly oversized proxy meshes, and a per-pixel ray/implicit-surface
intersection in the fragment shader produces the exact silhouette, depth, and
normal of the true shape. A sphere costs 20 triangles no matter how close the
camera gets; a crystal of tens of thousands of atoms uploads two tiny proxy
meshes plus one instance record per atom and bond.

The crate deliberately stops at the rendering core. Window creation, the event
loop, and input handling stay with the application; it hands the crate a
[`context::GraphicsBackend`] (the production one wraps an OpenGL context
through [glow](https://docs.rs/glow/)) and drives the scene graph once per
frame.

## Structure

* [`procedural`]: pure triangle-soup generators for the proxy shapes.
* [`transform`]: validated 4x4 transform constructors
  (we use the [glam](https://docs.rs/glam/) library for math operations).
* [`context`]: the graphics-API abstraction and its global context.
* [`resource`]: shader programs, static meshes, textures.
* [`renderable`]: the [`Renderable`](renderable::Renderable) protocol, scene
  composition, and the impostor renderers.
* [`world`]: the per-application clock and shading-mode selector.

## A minimal frame loop

```no_run
use lattice3d::prelude::*;

fn run(world: Rc<World>, scene: &mut Scene, width: u32, height: u32) {
    let projection = transform::perspective_projection(width, height, 45.0, 0.1, 100.0).unwrap();
    let view = transform::translate(Vec3::new(0.0, 0.0, -10.0));

    world.sample_time();
    let _ = scene.render(&projection, &view, &Mat4::IDENTITY);
}
```

Once the window goes away, `scene.close()` releases every GPU resource the
scene owns; closing twice is harmless.
*/
#![allow(clippy::module_inception)]

pub use glamx;

pub mod context;
pub mod error;
pub mod procedural;
pub mod renderable;
pub mod resource;
pub mod transform;
pub mod world;

pub use crate::error::Error;

pub mod prelude {
    pub use crate::context::*;
    pub use crate::error::Error;
    pub use crate::procedural::*;
    pub use crate::renderable::*;
    pub use crate::resource::*;
    pub use crate::transform;
    pub use crate::world::*;
    pub use glamx::{Mat4, Vec3};
    pub use std::rc::Rc;
}

#[cfg(test)]
mod test_support;
