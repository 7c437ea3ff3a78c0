//! # Validation Metrics
//!
//! Prometheus metrics for the trajectory validation engine.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! tv-validation = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `validation_reports_total` - Reports ingested (by outcome)
//! - `validation_votes_total` - Votes submitted (by outcome)
//! - `validation_consensus_resolved_total` - Resolved verdicts (by verdict)
//! - `validation_state_transitions_total` - State changes (by target state)
//! - `validation_players_kicked_total` - Kicks issued
//! - `validation_registered_players` - Currently registered players

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Reports ingested, labeled by outcome
    pub static ref REPORTS: IntCounterVec = register_int_counter_vec!(
        "validation_reports_total",
        "Total number of position reports ingested",
        &["outcome"]
    )
    .expect("Failed to create REPORTS metric");

    /// Votes submitted, labeled by outcome
    pub static ref VOTES: IntCounterVec = register_int_counter_vec!(
        "validation_votes_total",
        "Total number of validation votes submitted",
        &["outcome"]
    )
    .expect("Failed to create VOTES metric");

    /// Resolved consensus verdicts
    pub static ref CONSENSUS_RESOLVED: IntCounterVec = register_int_counter_vec!(
        "validation_consensus_resolved_total",
        "Total number of resolved consensus verdicts",
        &["verdict"]
    )
    .expect("Failed to create CONSENSUS_RESOLVED metric");

    /// State transitions, labeled by the new state
    pub static ref STATE_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "validation_state_transitions_total",
        "Total number of validation state transitions",
        &["state"]
    )
    .expect("Failed to create STATE_TRANSITIONS metric");

    /// Players kicked
    pub static ref PLAYERS_KICKED: IntCounter = register_int_counter!(
        "validation_players_kicked_total",
        "Total number of players kicked"
    )
    .expect("Failed to create PLAYERS_KICKED metric");

    /// Registered players
    pub static ref REGISTERED_PLAYERS: IntGauge = register_int_gauge!(
        "validation_registered_players",
        "Number of currently registered players"
    )
    .expect("Failed to create REGISTERED_PLAYERS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_report(outcome: &str) {
    REPORTS.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_vote(outcome: &str) {
    VOTES.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_consensus_resolved(verdict: &str) {
    CONSENSUS_RESOLVED.with_label_values(&[verdict]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_state_transition(state: &str) {
    STATE_TRANSITIONS.with_label_values(&[state]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_player_kicked() {
    PLAYERS_KICKED.inc();
}

#[cfg(feature = "metrics")]
pub fn set_registered_players(count: usize) {
    REGISTERED_PLAYERS.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_report(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_consensus_resolved(_verdict: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_state_transition(_state: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_player_kicked() {}

#[cfg(not(feature = "metrics"))]
pub fn set_registered_players(_count: usize) {}
