//! Position/thrust predictor
//!
//! Fixed-step kinematic extrapolation from the last known state:
//!
//! ```text
//! a  = gravity(last.position) + thrust / mass
//! p' = p + v·dt + ½·a·dt²
//! v' = v + a·dt
//! ```
//!
//! `thrust` is whatever drove the interval: the incoming report's thrust
//! when one is being judged, otherwise the last reported thrust.
//!
//! Report intervals are short enough that this is indistinguishable from a
//! curved orbital arc within tolerance. When the gravity model has no live
//! body for the player the predictor degrades to the last known position.

use super::registry::BodyHandle;
use super::report::{PositionReport, Vec3};
use crate::config::ValidationConfig;
use crate::ports::GravityModel;

/// Predicted state after `delta_time`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Gravity used for the prediction; `None` when degraded
    pub gravity: Option<Vec3>,
    pub delta_time: f64,
}

impl Prediction {
    /// No gravity was available, position is the last known one
    pub fn is_degraded(&self) -> bool {
        self.gravity.is_none()
    }
}

/// Integrate constant acceleration over `dt`
pub fn integrate(position: &Vec3, velocity: &Vec3, acceleration: &Vec3, dt: f64) -> (Vec3, Vec3) {
    let next_position = position + velocity * dt + acceleration * (0.5 * dt * dt);
    let next_velocity = velocity + acceleration * dt;
    (next_position, next_velocity)
}

/// Predictor bound to one configuration snapshot and gravity model
pub struct Predictor<'a, G: GravityModel + ?Sized> {
    config: &'a ValidationConfig,
    gravity: &'a G,
}

impl<'a, G: GravityModel + ?Sized> Predictor<'a, G> {
    pub fn new(config: &'a ValidationConfig, gravity: &'a G) -> Self {
        Self { config, gravity }
    }

    /// Gravity felt by the player's body at `position`
    pub fn gravity_at(&self, body: Option<BodyHandle>, position: &Vec3) -> Option<Vec3> {
        body.and_then(|handle| self.gravity.acceleration_at(handle, position))
    }

    /// Acceleration produced by a thrust force on a ship of configured mass
    pub fn thrust_acceleration(&self, thrust: &Vec3) -> Vec3 {
        thrust / self.config.player_mass
    }

    /// Predict where the player should be `delta_time` after `last`,
    /// assuming the last reported thrust keeps burning
    pub fn predict(
        &self,
        last: &PositionReport,
        body: Option<BodyHandle>,
        delta_time: f64,
    ) -> Prediction {
        self.predict_under_thrust(last, body, delta_time, &last.thrust)
    }

    /// Predict with `thrust` applied over the whole interval
    pub fn predict_under_thrust(
        &self,
        last: &PositionReport,
        body: Option<BodyHandle>,
        delta_time: f64,
        thrust: &Vec3,
    ) -> Prediction {
        let dt = delta_time.max(0.0);

        match self.gravity_at(body, &last.position) {
            Some(gravity) => {
                let acceleration = gravity + self.thrust_acceleration(thrust);
                let (position, velocity) =
                    integrate(&last.position, &last.velocity, &acceleration, dt);
                Prediction {
                    position,
                    velocity,
                    gravity: Some(gravity),
                    delta_time: dt,
                }
            }
            None => Prediction {
                position: last.position,
                velocity: last.velocity,
                gravity: None,
                delta_time: dt,
            },
        }
    }

    /// Gravity-only position after `delta_time` (no thrust at all)
    pub fn predict_ballistic(
        &self,
        last: &PositionReport,
        body: Option<BodyHandle>,
        delta_time: f64,
    ) -> Option<Vec3> {
        let dt = delta_time.max(0.0);
        let gravity = self.gravity_at(body, &last.position)?;
        Some(integrate(&last.position, &last.velocity, &gravity, dt).0)
    }
}
