//! Knobs for loading a .bvh document.

/// What to do with sample lines that follow the declared number of frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailingSamples {
    /// Drop them and log a warning.
    #[default]
    Ignore,
    /// Fail with `Error::MalformedMotionBlock`.
    Reject,
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub trailing_samples: TrailingSamples,

    /// Evaluate each joint's frames on the rayon thread pool.
    /// Only has an effect with the `parallel` feature enabled.
    pub parallel_frames: bool,
}

impl Config {
    pub fn strict() -> Self {
        Config {
            trailing_samples: TrailingSamples::Reject,
            ..Config::default()
        }
    }

    pub fn with_parallel_frames(mut self, parallel: bool) -> Self {
        self.parallel_frames = parallel;
        self
    }
}
