//! Simulation configuration.

use std::env;

use crate::error::{SimulationError, SimulationResult};

/// Scripted session parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Peers in the session; each flies one ship and runs one engine
    pub peers: u64,
    /// Ticks to simulate
    pub ticks: u64,
    /// Seconds between position reports
    pub tick_seconds: f64,
    /// Integration substeps per tick
    pub substeps: u32,
    /// Player that falsifies its reports, if any
    pub cheater: Option<u64>,
    /// First tick on which the cheater teleports
    pub cheat_from_tick: u64,
    /// Distance the cheater skips ahead per tick (m)
    pub cheat_offset: f64,
    /// Cheater also votes every honest report invalid
    pub byzantine_votes: bool,
    /// Seed for latency jitter
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            peers: 5,
            ticks: 40,
            tick_seconds: 1.0,
            substeps: 20,
            cheater: Some(5),
            cheat_from_tick: 10,
            cheat_offset: 40.0,
            byzantine_votes: true,
            seed: 7,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TV_SIM_PEERS`: Peers in the session (default: 5)
    /// - `TV_SIM_TICKS`: Ticks to run (default: 40)
    /// - `TV_SIM_TICK_SECONDS`: Report interval (default: 1.0)
    /// - `TV_SIM_CHEATER`: Cheating player id, `none` to disable (default: 5)
    /// - `TV_SIM_CHEAT_FROM`: First cheating tick (default: 10)
    /// - `TV_SIM_CHEAT_OFFSET`: Teleport distance per tick (default: 40.0)
    /// - `TV_SIM_BYZANTINE_VOTES`: Cheater lies in its votes (default: true)
    /// - `TV_SIM_SEED`: Jitter seed (default: 7)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            peers: parse_or("TV_SIM_PEERS", defaults.peers),
            ticks: parse_or("TV_SIM_TICKS", defaults.ticks),
            tick_seconds: parse_or("TV_SIM_TICK_SECONDS", defaults.tick_seconds),
            substeps: defaults.substeps,
            cheater: match env::var("TV_SIM_CHEATER") {
                Ok(v) if v.eq_ignore_ascii_case("none") => None,
                Ok(v) => v.trim().parse().ok().or(defaults.cheater),
                Err(_) => defaults.cheater,
            },
            cheat_from_tick: parse_or("TV_SIM_CHEAT_FROM", defaults.cheat_from_tick),
            cheat_offset: parse_or("TV_SIM_CHEAT_OFFSET", defaults.cheat_offset),
            byzantine_votes: env::var("TV_SIM_BYZANTINE_VOTES")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.byzantine_votes),
            seed: parse_or("TV_SIM_SEED", defaults.seed),
        }
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if self.peers < 2 {
            return Err(SimulationError::InvalidConfig(
                "a session needs at least two peers".into(),
            ));
        }
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            return Err(SimulationError::InvalidConfig(
                "tick_seconds must be positive".into(),
            ));
        }
        if self.substeps == 0 {
            return Err(SimulationError::InvalidConfig(
                "substeps must be at least 1".into(),
            ));
        }
        if let Some(cheater) = self.cheater {
            if cheater == 0 || cheater > self.peers {
                return Err(SimulationError::InvalidConfig(format!(
                    "cheater {cheater} is not one of the {} peers",
                    self.peers
                )));
            }
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
