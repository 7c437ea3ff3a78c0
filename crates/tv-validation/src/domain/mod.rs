//! Domain module for trajectory validation
//!
//! Pure logic: nothing here locks, logs or talks to the outside world.
//!
//! ## Core Modules
//! - report: Position reports and player ids
//! - history: Bounded per-player report buffers
//! - tolerance: Position and thrust error bounds
//! - predictor: Kinematic extrapolation over the gravity model
//! - validator: Position, thrust and distance-over-time checks
//! - consensus: Peer votes and supermajority tally
//! - state_machine: TRUSTED → SUSPECT → FLAGGED → KICKED lifecycle
//! - registry: Player to gravity body association

pub mod consensus;
pub mod history;
pub mod predictor;
pub mod registry;
pub mod report;
pub mod state_machine;
pub mod tolerance;
pub mod validator;

pub use consensus::{
    meets_threshold, required_votes, tally, threshold_percent, ConsensusAggregator,
    ConsensusResult, ConsensusVerdict, ValidationVote, VoteRecord, MAX_PENDING_SEQUENCES,
};
pub use history::{HistoryInsert, HistoryStore, ReportHistory};
pub use predictor::{integrate, Prediction, Predictor};
pub use registry::{BodyHandle, PlayerRegistry};
pub use report::{PlayerId, PositionReport, SequenceNumber, ValidatorId, Vec3};
pub use state_machine::{
    EscalationPolicy, FailureAccounting, PlayerValidation, Transition, ValidationState,
};
pub use tolerance::ToleranceCalculator;
pub use validator::{
    DistanceCheck, PlayerSnapshot, PositionCheck, ThrustCheck, TrajectoryValidator,
    MIN_THRUST_INFERENCE_DT,
};
