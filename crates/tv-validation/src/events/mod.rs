//! Events module for trajectory validation
//!
//! Everything the engine pushes to `ValidationEventPublisher`s.

pub mod outgoing;

pub use outgoing::{
    EventId, PlayerKickedEvent, TransitionReason, ValidationEvent, ValidationStateChangedEvent,
};
