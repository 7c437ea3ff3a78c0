//! Error types for the validation engine
//!
//! Only caller mistakes are errors. Late reports, unknown players and
//! insufficient votes are expected in a networked session and are reported
//! through outcome enums instead (`ReportOutcome`, `VoteOutcome`).

use crate::domain::PlayerId;
use thiserror::Error;

/// Validation engine errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Player id already has a live registration
    #[error("Player already registered: {player_id}")]
    PlayerAlreadyRegistered { player_id: PlayerId },

    /// Configuration value out of range
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
