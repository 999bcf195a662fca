//! Ordered composition of renderables.

use glamx::Mat4;

use crate::error::Error;
use crate::renderable::Renderable;

/// An ordered collection of renderables drawn as one.
///
/// Children render in insertion order, which matters for overlapping or
/// transparent draws. The scene exclusively owns its children: closing the
/// scene closes every child exactly once.
pub struct Scene {
    models: Vec<Box<dyn Renderable>>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Scene {
        Scene { models: Vec::new() }
    }

    /// Appends a renderable; it will draw after all previously added ones.
    pub fn add_model<R: Renderable + 'static>(&mut self, model: R) {
        self.models.push(Box::new(model));
    }

    /// Number of direct children.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderable for Scene {
    /// Forwards the same projection, view, and model matrices to every child.
    ///
    /// A child that needs its own model matrix wraps itself in a
    /// [`ModelTransformer`](crate::renderable::ModelTransformer). A child
    /// failing to draw (a degenerate transform, say) is skipped for this frame
    /// and its siblings still render.
    fn render(&mut self, projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<(), Error> {
        for (i, child) in self.models.iter_mut().enumerate() {
            if let Err(err) = child.render(projection, view, model) {
                log::warn!("Skipping scene child {} for this frame: {}", i, err);
            }
        }

        Ok(())
    }

    /// Closes every child, best-effort: a failing child does not keep the
    /// remaining children from closing. All failures are surfaced together.
    fn close(&mut self) -> Result<(), Error> {
        let mut failures = Vec::new();

        for child in &mut self.models {
            if let Err(err) = child.close() {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Close(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeModel {
        renders: Rc<Cell<u32>>,
        closes: Rc<Cell<u32>>,
        last_model: Rc<Cell<Mat4>>,
        fail_render: bool,
        fail_close: bool,
    }

    impl FakeModel {
        fn new() -> (FakeModel, Rc<Cell<u32>>, Rc<Cell<u32>>, Rc<Cell<Mat4>>) {
            let renders = Rc::new(Cell::new(0));
            let closes = Rc::new(Cell::new(0));
            let last_model = Rc::new(Cell::new(Mat4::ZERO));
            let fake = FakeModel {
                renders: renders.clone(),
                closes: closes.clone(),
                last_model: last_model.clone(),
                fail_render: false,
                fail_close: false,
            };
            (fake, renders, closes, last_model)
        }
    }

    impl Renderable for FakeModel {
        fn render(&mut self, _: &Mat4, _: &Mat4, model: &Mat4) -> Result<(), Error> {
            if self.fail_render {
                return Err(Error::DegenerateTransform("view"));
            }

            self.renders.set(self.renders.get() + 1);
            self.last_model.set(*model);
            Ok(())
        }

        fn close(&mut self) -> Result<(), Error> {
            self.closes.set(self.closes.get() + 1);
            if self.fail_close {
                Err(Error::Backend("induced close failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn children_receive_the_matrices_unchanged() {
        let (first, first_renders, _, first_model) = FakeModel::new();
        let (second, second_renders, _, second_model) = FakeModel::new();

        let mut scene = Scene::new();
        scene.add_model(first);
        scene.add_model(second);
        assert_eq!(scene.model_count(), 2);

        let model = Mat4::from_translation(glamx::Vec3::new(1.0, -2.0, 3.0));
        scene
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &model)
            .unwrap();

        assert_eq!(first_renders.get(), 1);
        assert_eq!(second_renders.get(), 1);
        assert_eq!(first_model.get(), model);
        assert_eq!(second_model.get(), model);
    }

    #[test]
    fn a_failing_child_does_not_stop_its_siblings() {
        let (mut first, _, _, _) = FakeModel::new();
        first.fail_render = true;
        let (second, second_renders, _, _) = FakeModel::new();

        let mut scene = Scene::new();
        scene.add_model(first);
        scene.add_model(second);

        let result = scene.render(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);

        assert!(result.is_ok());
        assert_eq!(second_renders.get(), 1);
    }

    #[test]
    fn close_reaches_every_child_exactly_once_even_when_one_fails() {
        let (first, _, first_closes, _) = FakeModel::new();
        let (mut second, _, second_closes, _) = FakeModel::new();
        second.fail_close = true;
        let (third, _, third_closes, _) = FakeModel::new();

        let mut scene = Scene::new();
        scene.add_model(first);
        scene.add_model(second);
        scene.add_model(third);

        let result = scene.close();

        assert!(matches!(result, Err(Error::Close(ref failures)) if failures.len() == 1));
        assert_eq!(first_closes.get(), 1);
        assert_eq!(second_closes.get(), 1);
        assert_eq!(third_closes.get(), 1);
    }
}
