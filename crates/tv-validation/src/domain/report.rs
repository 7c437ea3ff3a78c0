//! Position reports and identifiers
//!
//! A report is what one peer claims about its own ship at one tick. Reports
//! are immutable once built; the history store owns them after ingestion.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 3D vector in simulation units (metres, m/s, newtons)
pub type Vec3 = Vector3<f64>;

/// Per-player monotonic report counter
pub type SequenceNumber = u64;

/// Stable session-wide player identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Every peer validates every other peer, so validators are players too
pub type ValidatorId = PlayerId;

/// Movement/thrust report received from the network layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Player the report describes
    pub player_id: PlayerId,
    /// Simulation time of the report (seconds)
    pub timestamp: f64,
    /// Reported position (m)
    pub position: Vec3,
    /// Reported velocity (m/s)
    pub velocity: Vec3,
    /// Thrust force applied since the previous report (N)
    ///
    /// Prediction assumes the player keeps this thrust until the next report.
    pub thrust: Vec3,
    /// Reported orientation
    pub rotation: UnitQuaternion<f64>,
    /// Monotonic per-player sequence number
    pub sequence: SequenceNumber,
}

impl PositionReport {
    /// Create a report with no thrust and identity rotation
    pub fn new(
        player_id: PlayerId,
        sequence: SequenceNumber,
        timestamp: f64,
        position: Vec3,
        velocity: Vec3,
    ) -> Self {
        Self {
            player_id,
            timestamp,
            position,
            velocity,
            thrust: Vec3::zeros(),
            rotation: UnitQuaternion::identity(),
            sequence,
        }
    }

    pub fn with_thrust(mut self, thrust: Vec3) -> Self {
        self.thrust = thrust;
        self
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Magnitude of the reported velocity
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Magnitude of the reported thrust
    pub fn thrust_magnitude(&self) -> f64 {
        self.thrust.norm()
    }
}
