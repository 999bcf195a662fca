//! Application-wide animation clock and shading-mode selector.

use std::cell::Cell;

use web_time::Instant;

/// How the impostor fragment shaders shade the implicit surface.
///
/// The selector is uploaded to every impostor program each frame, so switching
/// modes takes effect on the next frame without touching any GPU resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImpostorMode {
    /// Textured and lit implicit surface. The normal mode.
    Shaded,
    /// The raw oversized proxy geometry, without per-pixel trimming. Makes the
    /// billboard hull visible for debugging.
    Hull,
    /// The implicit surface colored by its surface normal.
    Normals,
}

impl ImpostorMode {
    /// The value uploaded as the `impostor_mode` uniform.
    pub fn as_uniform(self) -> u32 {
        match self {
            ImpostorMode::Shaded => 0,
            ImpostorMode::Hull => 1,
            ImpostorMode::Normals => 2,
        }
    }

    /// The next mode, wrapping around. Handy for a debug key binding.
    pub fn next(self) -> ImpostorMode {
        match self {
            ImpostorMode::Shaded => ImpostorMode::Hull,
            ImpostorMode::Hull => ImpostorMode::Normals,
            ImpostorMode::Normals => ImpostorMode::Shaded,
        }
    }
}

/// Per-application state read by the renderables each frame.
///
/// The world is shared read-only with the renderables (through `Rc`); only the
/// application loop and its input handlers write it. Time is sampled exactly
/// once per frame so that every renderable of a frame sees the same clock.
pub struct World {
    start: Instant,
    time: Cell<f64>,
    impostor_mode: Cell<ImpostorMode>,
}

impl World {
    /// Creates a world with its clock at zero.
    pub fn new() -> World {
        World {
            start: Instant::now(),
            time: Cell::new(0.0),
            impostor_mode: Cell::new(ImpostorMode::Shaded),
        }
    }

    /// Captures the current clock value. Called once per frame, at the frame
    /// boundary, by the application loop.
    pub fn sample_time(&self) -> f64 {
        let now = self.start.elapsed().as_secs_f64();
        self.time.set(now);
        now
    }

    /// The clock value captured by the last `sample_time` call. Stable for the
    /// whole frame.
    pub fn time(&self) -> f64 {
        self.time.get()
    }

    /// The active impostor shading mode.
    pub fn impostor_mode(&self) -> ImpostorMode {
        self.impostor_mode.get()
    }

    /// Selects the impostor shading mode. Takes effect on the next frame.
    pub fn set_impostor_mode(&self, mode: ImpostorMode) {
        self.impostor_mode.set(mode);
    }

    /// Advances to the next impostor shading mode.
    pub fn cycle_impostor_mode(&self) {
        self.impostor_mode.set(self.impostor_mode.get().next());
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_stable_between_samples() {
        let world = World::new();

        let sampled = world.sample_time();
        assert_eq!(world.time(), sampled);
        assert_eq!(world.time(), sampled);

        let resampled = world.sample_time();
        assert!(resampled >= sampled);
        assert_eq!(world.time(), resampled);
    }

    #[test]
    fn impostor_mode_cycles_through_all_variants() {
        let world = World::new();
        assert_eq!(world.impostor_mode(), ImpostorMode::Shaded);

        world.cycle_impostor_mode();
        assert_eq!(world.impostor_mode(), ImpostorMode::Hull);
        world.cycle_impostor_mode();
        assert_eq!(world.impostor_mode(), ImpostorMode::Normals);
        world.cycle_impostor_mode();
        assert_eq!(world.impostor_mode(), ImpostorMode::Shaded);

        world.set_impostor_mode(ImpostorMode::Normals);
        assert_eq!(world.impostor_mode().as_uniform(), 2);
    }
}
