//! Driving ports (Inbound API)
//!
//! Synchronous: the host calls these from its network-receive and tick
//! callbacks. Nothing here fails for an unknown player; queries fall back to
//! safe defaults and commands report `UnknownPlayer` in their outcome.

use crate::domain::{
    BodyHandle, ConsensusResult, FailureAccounting, PlayerId, PositionReport, SequenceNumber,
    ValidationState, ValidationVote, ValidatorId, Vec3,
};
use crate::error::ValidationResult;
use serde::{Deserialize, Serialize};

/// Result of ingesting a position report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Newest report for the player
    Accepted,
    /// Older than or equal to the newest; kept for history but not voted on
    Stale,
    UnknownPlayer,
}

impl ReportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportOutcome::Accepted => "accepted",
            ReportOutcome::Stale => "stale",
            ReportOutcome::UnknownPlayer => "unknown_player",
        }
    }
}

/// Result of submitting a vote
#[derive(Clone, Debug, PartialEq)]
pub enum VoteOutcome {
    /// Recorded; the tally does not decide yet
    Pending(ConsensusResult),
    /// The vote completed a verdict and it was applied
    Resolved {
        result: ConsensusResult,
        state: ValidationState,
    },
    /// Sequence already resolved; ignored
    Superseded,
    /// Subject is kicked; nothing more to decide
    AlreadyKicked,
    /// Voter and subject are the same player
    SelfVote,
    /// Subject or voter is not registered
    UnknownPlayer,
}

impl VoteOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, VoteOutcome::Resolved { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteOutcome::Pending(_) => "pending",
            VoteOutcome::Resolved { .. } => "resolved",
            VoteOutcome::Superseded => "superseded",
            VoteOutcome::AlreadyKicked => "already_kicked",
            VoteOutcome::SelfVote => "self_vote",
            VoteOutcome::UnknownPlayer => "unknown_player",
        }
    }
}

/// Inspection view of one player
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub body: BodyHandle,
    pub state: ValidationState,
    pub accounting: FailureAccounting,
    pub successes: u64,
    pub latency_rtt: f64,
    pub history_len: usize,
    pub last_sequence: Option<SequenceNumber>,
    pub resolved_sequence: Option<SequenceNumber>,
}

/// Primary validation API
pub trait ValidationApi: Send + Sync {
    // ---- registry ----

    /// Associate a player with its gravity body
    fn register_player(&self, player_id: PlayerId, body: BodyHandle) -> ValidationResult<()>;

    /// Drop the player and every trace of it (history, votes, failures,
    /// latency). Returns false if it was not registered.
    fn unregister_player(&self, player_id: PlayerId) -> bool;

    /// Record the player's measured round-trip latency (seconds)
    fn update_player_latency(&self, player_id: PlayerId, rtt_seconds: f64) -> bool;

    // ---- reports ----

    fn add_position_report(&self, report: PositionReport) -> ReportOutcome;

    /// Validate a fresh report against prior history, store it, and return
    /// this peer's vote. `None` for unknown players and stale reports.
    fn process_report(
        &self,
        validator_id: ValidatorId,
        report: PositionReport,
    ) -> Option<ValidationVote>;

    /// Oldest-first history, empty for unknown players
    fn history(&self, player_id: PlayerId) -> Vec<PositionReport>;

    fn last_report(&self, player_id: PlayerId) -> Option<PositionReport>;

    // ---- validation (read-only) ----

    fn validate_position(&self, player_id: PlayerId, reported: &Vec3, timestamp: f64) -> bool;

    /// Check that `thrust` explains the trajectory up to `position` at
    /// `timestamp`, and stays under the force cap
    fn validate_thrust(
        &self,
        player_id: PlayerId,
        thrust: &Vec3,
        position: &Vec3,
        timestamp: f64,
    ) -> bool;

    fn validate_distance_over_time(&self, player_id: PlayerId, time_window: f64) -> bool;

    /// Expected position `delta_time` after the last report
    ///
    /// Degrades to the last known position without a live body; `None`
    /// without any history.
    fn predict_position(&self, player_id: PlayerId, delta_time: f64) -> Option<Vec3>;

    fn position_tolerance(&self, delta_time: f64, player_id: PlayerId) -> f64;

    fn thrust_tolerance(&self) -> f64;

    // ---- consensus ----

    fn submit_validation_vote(&self, vote: ValidationVote) -> VoteOutcome;

    fn calculate_consensus(&self, player_id: PlayerId, sequence: SequenceNumber)
        -> ConsensusResult;

    /// Consensus on the most recent sequence with any votes
    fn is_consensus_reached(&self, player_id: PlayerId) -> bool;

    // ---- state machine ----

    /// Trusted for unknown players
    fn get_validation_state(&self, player_id: PlayerId) -> ValidationState;

    fn should_kick_player(&self, player_id: PlayerId) -> bool;

    /// Apply a consensus result directly; returns the resulting state
    ///
    /// Results without quorum or still pending leave the state untouched.
    fn update_validation_state(
        &self,
        player_id: PlayerId,
        result: &ConsensusResult,
    ) -> ValidationState;

    /// Back to Trusted with a clean failure window
    fn reset_validation_state(&self, player_id: PlayerId) -> bool;
}
