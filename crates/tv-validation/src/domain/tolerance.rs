//! Tolerance calculator
//!
//! Pure functions of the configuration and the player's measured round-trip
//! latency. Nothing here touches engine state.

use crate::config::ValidationConfig;

/// Error bounds derived from one configuration snapshot
#[derive(Clone, Copy, Debug)]
pub struct ToleranceCalculator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> ToleranceCalculator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        Self { config }
    }

    /// Acceptable position error after `delta_time` seconds
    ///
    /// `base + rate * dt + latency_compensation(rtt)`. Negative `dt` (a
    /// report older than the last one) is treated as zero, so the bound is
    /// monotonically non-decreasing in `dt`.
    pub fn position_tolerance(&self, delta_time: f64, latency_rtt: f64) -> f64 {
        let dt = delta_time.max(0.0);
        self.config.base_position_tolerance
            + self.config.time_tolerance_rate * dt
            + self.latency_compensation(latency_rtt)
    }

    /// Extra slack for a player whose reports arrive `rtt` seconds late
    ///
    /// Round-trip latency widens the timing uncertainty of a report the same
    /// way elapsed time does, so it is charged at the time tolerance rate.
    pub fn latency_compensation(&self, latency_rtt: f64) -> f64 {
        if !latency_rtt.is_finite() {
            return 0.0;
        }
        self.config.time_tolerance_rate * latency_rtt.max(0.0)
    }

    /// Acceptable thrust error (N)
    pub fn thrust_tolerance(&self) -> f64 {
        self.config
            .base_thrust_tolerance
            .max(self.config.thrust_tolerance_percentage * self.config.max_thrust_force)
    }
}
