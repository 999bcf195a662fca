//! The rendering protocol every drawable object implements.

use glamx::Mat4;

use crate::error::Error;

/// A drawable object: leaf renderers and composites alike.
///
/// Renderables exclusively own their GPU resources. `close` must be called
/// before the graphics context goes away; it is idempotent, so composite
/// owners may close defensively.
pub trait Renderable {
    /// Draws the object for the current frame.
    ///
    /// `projection` and `view` come from the camera; `model` is the transform
    /// accumulated from the scene-graph root down to this object. A
    /// [`DegenerateTransform`](Error::DegenerateTransform) failure means the
    /// draw was skipped; it leaves no partial GPU state behind.
    fn render(&mut self, projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<(), Error>;

    /// Releases the object's GPU resources. Calling `close` again after a
    /// successful close is a no-op.
    fn close(&mut self) -> Result<(), Error>;
}
