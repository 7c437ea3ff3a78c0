//! Manually driven clock
//!
//! Deterministic time for tests, replays and lock-step simulations.

use crate::ports::TimeSource;
use parking_lot::RwLock;

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: RwLock<f64>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        *self.now.write() = now;
    }

    /// Move forward by `seconds`; returns the new time
    pub fn advance(&self, seconds: f64) -> f64 {
        let mut now = self.now.write();
        *now += seconds;
        *now
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        *self.now.read()
    }
}
