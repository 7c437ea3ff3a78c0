//! # tv-validation
//!
//! Byzantine-fault-tolerant trajectory validation for multiplayer space
//! simulations.
//!
//! ## Architecture
//!
//! Every peer runs one engine and judges every other player's position
//! reports against a kinematic prediction built on the host's gravity model.
//! Judgements travel as votes; a supermajority of peers decides whether a
//! report was legitimate, and repeated rejections escalate the player:
//!
//! ```text
//! PositionReport ──→ [History] ──→ [Validator] ──vote──→ [Consensus]
//!                                       │                     │ verdict
//!                                  [Predictor]                ↓
//!                                       │              [State Machine]
//!                                 GravityModel port           │
//!                                                    ValidationEvent ──→ host
//! ```
//!
//! ### Lifecycle
//!
//! ```text
//! TRUSTED ──invalid──→ SUSPECT ──flag threshold──→ FLAGGED ──kick threshold──→ KICKED
//!    ↑                                                                          │
//!    └──────────────────────── reset_validation_state ─────────────────────────┘
//! ```
//!
//! Failures count inside a rolling `KickTimeWindow`. The engine never
//! disconnects anyone; `should_kick_player` and `PlayerKicked` events tell
//! the host to act.
//!
//! ### Failing open
//!
//! Missing gravity bodies, empty histories and insufficient votes never
//! count against a player. Only a quorum of peers can reject a report.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tv_validation::{PhysicsValidationEngine, UniformGravity, ValidationApi, ValidationConfig};
//!
//! let gravity = Arc::new(UniformGravity::earth());
//! let engine = PhysicsValidationEngine::new(ValidationConfig::default(), gravity.clone())?;
//! engine.register_player(PlayerId(1), gravity.spawn_body())?;
//!
//! if let Some(vote) = engine.process_report(local_id, report) {
//!     network.broadcast(&vote);
//!     engine.submit_validation_vote(vote);
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

pub use adapters::{
    BroadcastEventPublisher, InMemoryEventPublisher, ManualTimeSource, PointMassField,
    UniformGravity, GRAVITATIONAL_CONSTANT,
};
pub use config::ValidationConfig;
pub use domain::{
    BodyHandle, ConsensusResult, ConsensusVerdict, FailureAccounting, PlayerId, PositionReport,
    SequenceNumber, ValidationState, ValidationVote, ValidatorId, Vec3,
};
pub use error::{ValidationError, ValidationResult};
pub use events::{PlayerKickedEvent, TransitionReason, ValidationEvent, ValidationStateChangedEvent};
pub use ports::{
    GravityModel, PlayerSummary, ReportOutcome, SystemTimeSource, TimeSource, ValidationApi,
    ValidationEventPublisher, VoteOutcome,
};
pub use service::PhysicsValidationEngine;
