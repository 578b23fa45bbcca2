//! Frame timing

use std::time::Instant;
use tracing::trace;

/// Supplies the per-frame delta time fed to `Scene::update`.
///
/// Wall-clock frames go through [`tick`](Self::tick); headless loops and
/// tests drive the clock with [`advance`](Self::advance) instead.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    delta: f32,
    elapsed: f64,
    frame: u64,
    max_delta: f32,
}

impl FrameClock {
    /// Deltas above this are clamped (a stalled frame should not explode the simulation)
    pub const DEFAULT_MAX_DELTA: f32 = 0.25;

    pub fn new() -> Self {
        Self {
            last: None,
            delta: 0.0,
            elapsed: 0.0,
            frame: 0,
            max_delta: Self::DEFAULT_MAX_DELTA,
        }
    }

    /// Set the clamp applied to every delta
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    /// Measure the time since the previous tick. The first tick yields zero.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        self.advance(raw)
    }

    /// Advance by an explicit delta
    pub fn advance(&mut self, delta: f32) -> f32 {
        let clamped = delta.clamp(0.0, self.max_delta);
        self.delta = clamped;
        self.elapsed += f64::from(clamped);
        self.frame += 1;
        trace!(frame = self.frame, delta = clamped, "Frame advanced");
        clamped
    }

    /// Delta of the most recent frame, in seconds
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Total clamped time since creation, in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of frames advanced so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
