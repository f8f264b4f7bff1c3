//! Monotonic clock feeding the shader's time parameter.

use std::time::{Duration, Instant};

/// Source of elapsed time, in seconds since the clock started.
pub trait Clock {
    fn elapsed_seconds(&self) -> f32;
}

/// Wall-clock implementation backed by `Instant` (QueryPerformanceCounter on Windows).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    /// Create and start a new clock.
    pub fn start_now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start_now()
    }
}

impl Clock for MonotonicClock {
    fn elapsed_seconds(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

/// Clock frozen at a fixed time, for deterministic frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn elapsed_seconds(&self) -> f32 {
        self.0
    }
}
