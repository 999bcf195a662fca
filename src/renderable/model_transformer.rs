//! A renderable wrapper carrying its own animated model transform.

use glamx::Mat4;

use crate::error::Error;
use crate::renderable::Renderable;

/// Wraps one renderable with a function producing a fresh model matrix every
/// frame.
///
/// The wrapped object is drawn with `incoming_model * local()`: nesting N
/// transformers multiplies their matrices outermost-first before the leaf sees
/// the result, so animation composes the same way static transforms do.
pub struct ModelTransformer<R, F> {
    model: R,
    local_transform: F,
}

impl<R: Renderable, F: FnMut() -> Mat4> ModelTransformer<R, F> {
    /// Wraps `model`; `local_transform` is invoked once per render call.
    pub fn new(model: R, local_transform: F) -> ModelTransformer<R, F> {
        ModelTransformer {
            model,
            local_transform,
        }
    }
}

impl<R: Renderable, F: FnMut() -> Mat4> Renderable for ModelTransformer<R, F> {
    fn render(&mut self, projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<(), Error> {
        let local = (self.local_transform)();
        self.model.render(projection, view, &(*model * local))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.model.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform;
    use glamx::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;

    struct RecordingLeaf {
        received: Rc<Cell<Mat4>>,
        closes: Rc<Cell<u32>>,
    }

    impl RecordingLeaf {
        fn new() -> (RecordingLeaf, Rc<Cell<Mat4>>, Rc<Cell<u32>>) {
            let received = Rc::new(Cell::new(Mat4::ZERO));
            let closes = Rc::new(Cell::new(0));
            let leaf = RecordingLeaf {
                received: received.clone(),
                closes: closes.clone(),
            };
            (leaf, received, closes)
        }
    }

    impl Renderable for RecordingLeaf {
        fn render(&mut self, _: &Mat4, _: &Mat4, model: &Mat4) -> Result<(), Error> {
            self.received.set(*model);
            Ok(())
        }

        fn close(&mut self) -> Result<(), Error> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn nested_transformers_compose_outermost_first() {
        let (leaf, received, _) = RecordingLeaf::new();

        let a = transform::translate(Vec3::new(1.0, 2.0, 3.0));
        let b = transform::scale(2.0);
        let mut nested =
            ModelTransformer::new(ModelTransformer::new(leaf, move || b), move || a);

        let incoming = transform::rotate(Vec3::Y, 0.7).unwrap();
        nested
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &incoming)
            .unwrap();

        let expected = incoming * a * b;
        assert!(received.get().abs_diff_eq(expected, 1.0e-6));
    }

    #[test]
    fn the_transform_is_recomputed_every_frame() {
        let (leaf, received, _) = RecordingLeaf::new();

        let frame = Rc::new(Cell::new(0.0f32));
        let animated = frame.clone();
        let mut transformer = ModelTransformer::new(leaf, move || {
            transform::translate(Vec3::new(animated.get(), 0.0, 0.0))
        });

        transformer
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY)
            .unwrap();
        assert!(received
            .get()
            .abs_diff_eq(transform::translate(Vec3::ZERO), 1.0e-6));

        frame.set(5.0);
        transformer
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY)
            .unwrap();
        assert!(received
            .get()
            .abs_diff_eq(transform::translate(Vec3::new(5.0, 0.0, 0.0)), 1.0e-6));
    }

    #[test]
    fn close_delegates_to_the_wrapped_renderable() {
        let (leaf, _, closes) = RecordingLeaf::new();
        let mut transformer = ModelTransformer::new(leaf, Mat4::default);

        transformer.close().unwrap();

        assert_eq!(closes.get(), 1);
    }
}
