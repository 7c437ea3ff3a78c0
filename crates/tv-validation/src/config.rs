//! Validation configuration
//!
//! Twelve numeric knobs, all hot-reloadable through
//! `PhysicsValidationEngine::update_config`. Serialized keys use the
//! PascalCase names operators know from the game settings
//! (`BasePositionTolerance`, `KickThreshold`, ...).

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ValidationConfig {
    /// Position error always allowed, independent of elapsed time (m)
    pub base_position_tolerance: f64,
    /// Extra position error allowed per second since the last report (m/s)
    pub time_tolerance_rate: f64,
    /// Minimum thrust error allowed (N)
    pub base_thrust_tolerance: f64,
    /// Thrust error allowed as a fraction of `max_thrust_force`
    pub thrust_tolerance_percentage: f64,
    /// Fraction of valid votes required for a positive verdict
    pub consensus_threshold: f64,
    /// Failures within the window that flag a player
    pub flag_threshold: u32,
    /// Failures within the window that kick a player
    pub kick_threshold: u32,
    /// Rolling failure window (seconds)
    pub kick_time_window: f64,
    /// Reports retained per player
    pub max_history_size: usize,
    /// Largest thrust a ship can produce (N)
    pub max_thrust_force: f64,
    /// Largest plausible speed (m/s)
    pub max_speed: f64,
    /// Ship mass used to turn thrust into acceleration (kg)
    pub player_mass: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            base_position_tolerance: 5.0,
            time_tolerance_rate: 2.0,
            base_thrust_tolerance: 1_000.0,
            thrust_tolerance_percentage: 0.1,
            consensus_threshold: 0.67,
            flag_threshold: 3,
            kick_threshold: 5,
            kick_time_window: 30.0,
            max_history_size: 100,
            max_thrust_force: 100_000.0,
            max_speed: 1_000.0,
            player_mass: 50_000.0,
        }
    }
}

impl ValidationConfig {
    /// Defaults overridden by `TV_*` environment variables
    ///
    /// # Environment Variables
    ///
    /// - `TV_BASE_POSITION_TOLERANCE`, `TV_TIME_TOLERANCE_RATE`
    /// - `TV_BASE_THRUST_TOLERANCE`, `TV_THRUST_TOLERANCE_PERCENTAGE`
    /// - `TV_CONSENSUS_THRESHOLD`
    /// - `TV_FLAG_THRESHOLD`, `TV_KICK_THRESHOLD`, `TV_KICK_TIME_WINDOW`
    /// - `TV_MAX_HISTORY_SIZE`, `TV_MAX_THRUST_FORCE`, `TV_MAX_SPEED`
    /// - `TV_PLAYER_MASS`
    ///
    /// Unparseable values fall back to the default for that field.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_position_tolerance: env_or(
                "TV_BASE_POSITION_TOLERANCE",
                defaults.base_position_tolerance,
            ),
            time_tolerance_rate: env_or("TV_TIME_TOLERANCE_RATE", defaults.time_tolerance_rate),
            base_thrust_tolerance: env_or(
                "TV_BASE_THRUST_TOLERANCE",
                defaults.base_thrust_tolerance,
            ),
            thrust_tolerance_percentage: env_or(
                "TV_THRUST_TOLERANCE_PERCENTAGE",
                defaults.thrust_tolerance_percentage,
            ),
            consensus_threshold: env_or("TV_CONSENSUS_THRESHOLD", defaults.consensus_threshold),
            flag_threshold: env_or("TV_FLAG_THRESHOLD", defaults.flag_threshold),
            kick_threshold: env_or("TV_KICK_THRESHOLD", defaults.kick_threshold),
            kick_time_window: env_or("TV_KICK_TIME_WINDOW", defaults.kick_time_window),
            max_history_size: env_or("TV_MAX_HISTORY_SIZE", defaults.max_history_size),
            max_thrust_force: env_or("TV_MAX_THRUST_FORCE", defaults.max_thrust_force),
            max_speed: env_or("TV_MAX_SPEED", defaults.max_speed),
            player_mass: env_or("TV_PLAYER_MASS", defaults.player_mass),
        }
    }

    /// Reject configurations the engine cannot reason with
    pub fn validate(&self) -> ValidationResult<()> {
        non_negative("BasePositionTolerance", self.base_position_tolerance)?;
        non_negative("TimeToleranceRate", self.time_tolerance_rate)?;
        non_negative("BaseThrustTolerance", self.base_thrust_tolerance)?;
        non_negative("ThrustTolerancePercentage", self.thrust_tolerance_percentage)?;
        positive("KickTimeWindow", self.kick_time_window)?;
        positive("MaxThrustForce", self.max_thrust_force)?;
        positive("MaxSpeed", self.max_speed)?;
        positive("PlayerMass", self.player_mass)?;

        if !(self.consensus_threshold > 0.0 && self.consensus_threshold <= 1.0) {
            return Err(invalid("ConsensusThreshold", "must be in (0, 1]"));
        }
        if self.flag_threshold == 0 {
            return Err(invalid("FlagThreshold", "must be at least 1"));
        }
        if self.kick_threshold < self.flag_threshold {
            return Err(invalid("KickThreshold", "must not be below FlagThreshold"));
        }
        if self.max_history_size == 0 {
            return Err(invalid("MaxHistorySize", "must be at least 1"));
        }
        Ok(())
    }

    /// Highest acceleration thrust alone can produce (m/s²)
    pub fn max_thrust_acceleration(&self) -> f64 {
        self.max_thrust_force / self.player_mass
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn invalid(field: &'static str, reason: &str) -> ValidationError {
    ValidationError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

fn non_negative(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, non-negative number"))
    }
}

fn positive(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, positive number"))
    }
}
