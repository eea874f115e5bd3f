//! Monotonic receive-time clock.

use std::time::Instant;

/// Seconds-since-start clock used to stamp samples at receipt time.
///
/// Created once in `main` and cloned into each listener so the time axis is
/// shared across both wire formats. Backed by [`Instant`], so stamped
/// timestamps are monotonic regardless of wall-clock adjustments.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Start a new clock; `now_secs` is measured from this call.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was started.
    pub fn now_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}
