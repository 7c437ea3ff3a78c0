//! Trajectory validator
//!
//! Runs on an immutable `PlayerSnapshot` copied out of the engine, so every
//! check here is lock-free and side-effect free. Calling a check twice with
//! the same snapshot yields the same answer.
//!
//! Three independent checks:
//! - position: reported vs predicted, within `position_tolerance(dt)`
//! - thrust: the reported thrust must explain the deviation from
//!   gravity-only motion beyond `position_tolerance(dt)`, and stay under
//!   `max_thrust_force`
//!
//! A report's thrust is the thrust applied since the previous report, so
//! both checks of a vote run the interval under the incoming thrust.
//! - distance over time: path length over a trailing window must lie
//!   between the shortest and longest path the physics allows

use super::consensus::ValidationVote;
use super::predictor::Predictor;
use super::registry::BodyHandle;
use super::report::{PlayerId, PositionReport, ValidatorId, Vec3};
use super::tolerance::ToleranceCalculator;
use crate::config::ValidationConfig;
use crate::ports::GravityModel;

/// Shortest interval over which a thrust can be inferred from displacement
pub const MIN_THRUST_INFERENCE_DT: f64 = 1e-3;

/// Consistent copy of one player's validation inputs
#[derive(Clone, Debug)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub body: Option<BodyHandle>,
    /// Measured round-trip latency (seconds, 0 when unknown)
    pub latency_rtt: f64,
    /// Oldest-first history
    pub history: Vec<PositionReport>,
}

impl PlayerSnapshot {
    pub fn last(&self) -> Option<&PositionReport> {
        self.history.last()
    }
}

/// Position check outcome
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionCheck {
    pub passed: bool,
    /// Distance between reported and predicted position (m)
    pub error: f64,
    pub tolerance: f64,
    /// No gravity prediction was available; the check failed open
    pub degraded: bool,
}

/// Thrust check outcome
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrustCheck {
    pub passed: bool,
    /// Force equivalent of the deviation left unexplained by the reported
    /// thrust once the position tolerance is spent (N)
    pub residual: f64,
    pub tolerance: f64,
    pub within_max_force: bool,
}

/// Distance-over-time check outcome
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceCheck {
    pub passed: bool,
    pub travelled: f64,
    pub min_possible: f64,
    pub max_possible: f64,
    /// Time actually covered by the sampled reports
    pub span: f64,
}

impl DistanceCheck {
    fn unchecked() -> Self {
        Self {
            passed: true,
            travelled: 0.0,
            min_possible: 0.0,
            max_possible: f64::INFINITY,
            span: 0.0,
        }
    }
}

/// Validator bound to one configuration snapshot and gravity model
pub struct TrajectoryValidator<'a, G: GravityModel + ?Sized> {
    config: &'a ValidationConfig,
    predictor: Predictor<'a, G>,
    tolerance: ToleranceCalculator<'a>,
}

impl<'a, G: GravityModel + ?Sized> TrajectoryValidator<'a, G> {
    pub fn new(config: &'a ValidationConfig, gravity: &'a G) -> Self {
        Self {
            config,
            predictor: Predictor::new(config, gravity),
            tolerance: ToleranceCalculator::new(config),
        }
    }

    pub fn predictor(&self) -> &Predictor<'a, G> {
        &self.predictor
    }

    /// Compare a reported position against the prediction from history
    ///
    /// With no report thrust at hand the last reported thrust is assumed to
    /// continue. With no history there is nothing to contradict and the
    /// check passes.
    pub fn check_position(
        &self,
        snapshot: &PlayerSnapshot,
        reported_position: &Vec3,
        timestamp: f64,
    ) -> PositionCheck {
        self.position_under(snapshot, reported_position, timestamp, None)
    }

    /// Position check for a full report, predicted under its own thrust
    pub fn check_report_position(
        &self,
        snapshot: &PlayerSnapshot,
        report: &PositionReport,
    ) -> PositionCheck {
        self.position_under(
            snapshot,
            &report.position,
            report.timestamp,
            Some(&report.thrust),
        )
    }

    fn position_under(
        &self,
        snapshot: &PlayerSnapshot,
        reported_position: &Vec3,
        timestamp: f64,
        thrust: Option<&Vec3>,
    ) -> PositionCheck {
        let Some(last) = snapshot.last() else {
            return PositionCheck {
                passed: true,
                error: 0.0,
                tolerance: self.tolerance.position_tolerance(0.0, snapshot.latency_rtt),
                degraded: true,
            };
        };

        let delta_time = timestamp - last.timestamp;
        let thrust = thrust.unwrap_or(&last.thrust);
        let prediction = self
            .predictor
            .predict_under_thrust(last, snapshot.body, delta_time, thrust);
        let tolerance = self
            .tolerance
            .position_tolerance(delta_time, snapshot.latency_rtt);
        let error = (reported_position - prediction.position).norm();

        PositionCheck {
            passed: prediction.is_degraded() || error <= tolerance,
            error,
            tolerance,
            degraded: prediction.is_degraded(),
        }
    }

    /// Check that the reported thrust explains the reported trajectory
    ///
    /// Constant thrust `F` over `dt` displaces by `½·(F/m)·dt²` away from
    /// gravity-only motion. Whatever the claimed thrust leaves unexplained
    /// is first absorbed by `position_tolerance(dt)`, the same slack the
    /// position check grants for jitter. Only the excess is converted back
    /// to force (`2·m·excess / dt²`) and compared with `thrust_tolerance()`.
    /// When no ballistic reference exists (no history, tiny `dt`, missing
    /// body) only the force cap is enforced.
    pub fn check_thrust(
        &self,
        snapshot: &PlayerSnapshot,
        reported_thrust: &Vec3,
        reported_position: &Vec3,
        timestamp: f64,
    ) -> ThrustCheck {
        let tolerance = self.tolerance.thrust_tolerance();
        let within_max_force = reported_thrust.norm() <= self.config.max_thrust_force;

        let residual = snapshot
            .last()
            .and_then(|last| {
                let dt = timestamp - last.timestamp;
                if dt < MIN_THRUST_INFERENCE_DT {
                    return None;
                }
                let ballistic = self.predictor.predict_ballistic(last, snapshot.body, dt)?;
                let claimed =
                    self.predictor.thrust_acceleration(reported_thrust) * (0.5 * dt * dt);
                let unexplained = (reported_position - ballistic - claimed).norm();
                let slack = self.tolerance.position_tolerance(dt, snapshot.latency_rtt);
                let excess = (unexplained - slack).max(0.0);
                Some(excess * 2.0 * self.config.player_mass / (dt * dt))
            })
            .unwrap_or(0.0);

        ThrustCheck {
            passed: within_max_force && residual <= tolerance,
            residual,
            tolerance,
            within_max_force,
        }
    }

    /// Check path length over the trailing `time_window` of history
    ///
    /// With `T` the span actually covered by the sampled reports:
    /// - `max = max_speed·T + ½·(max_thrust / mass)·T² + base tolerance`
    /// - `min = |ā|·T²/4 − position_tolerance(T)`, where `ā` is the mean
    ///   claimed net acceleration (gravity + thrust / mass) over the
    ///   samples. `|a|·T²/4` is the shortest path any starting velocity
    ///   allows under constant acceleration `a`.
    ///
    /// Missing gravity for any sample drops the lower bound to zero.
    pub fn check_distance_over_time(
        &self,
        snapshot: &PlayerSnapshot,
        time_window: f64,
    ) -> DistanceCheck {
        let Some(last) = snapshot.last() else {
            return DistanceCheck::unchecked();
        };
        let since = last.timestamp - time_window.max(0.0);
        let samples: Vec<&PositionReport> = snapshot
            .history
            .iter()
            .filter(|r| r.timestamp >= since)
            .collect();

        let (Some(first), Some(newest)) = (samples.first(), samples.last()) else {
            return DistanceCheck::unchecked();
        };
        let span = newest.timestamp - first.timestamp;
        if samples.len() < 2 || span <= 0.0 {
            return DistanceCheck::unchecked();
        }

        let travelled: f64 = samples
            .windows(2)
            .map(|pair| (pair[1].position - pair[0].position).norm())
            .sum();

        let max_possible = self.config.max_speed * span
            + 0.5 * self.config.max_thrust_acceleration() * span * span
            + self.config.base_position_tolerance;

        let min_possible = self
            .mean_claimed_acceleration(snapshot.body, &samples)
            .map(|accel| {
                let bound = accel.norm() * span * span / 4.0
                    - self.tolerance.position_tolerance(span, snapshot.latency_rtt);
                bound.max(0.0)
            })
            .unwrap_or(0.0);

        DistanceCheck {
            passed: travelled >= min_possible && travelled <= max_possible,
            travelled,
            min_possible,
            max_possible,
            span,
        }
    }

    fn mean_claimed_acceleration(
        &self,
        body: Option<BodyHandle>,
        samples: &[&PositionReport],
    ) -> Option<Vec3> {
        let mut sum = Vec3::zeros();
        for report in samples {
            let gravity = self.predictor.gravity_at(body, &report.position)?;
            sum += gravity + self.predictor.thrust_acceleration(&report.thrust);
        }
        Some(sum / samples.len() as f64)
    }

    /// This peer's vote on a fresh report
    ///
    /// `snapshot` must hold the history before `report` was ingested.
    pub fn build_vote(
        &self,
        validator_id: ValidatorId,
        snapshot: &PlayerSnapshot,
        report: &PositionReport,
    ) -> ValidationVote {
        let position = self.check_report_position(snapshot, report);
        let thrust = self.check_thrust(
            snapshot,
            &report.thrust,
            &report.position,
            report.timestamp,
        );

        ValidationVote::new(
            validator_id,
            report.player_id,
            report.sequence,
            position.passed && thrust.passed,
            position.error,
            thrust.residual,
        )
    }
}
