//! Outgoing validation events
//!
//! Emitted only when a player's state actually changes. A kick produces a
//! `StateChanged` followed by a `PlayerKicked` so that listeners interested
//! only in kicks can ignore the rest.

use crate::domain::{PlayerId, SequenceNumber, Transition, ValidationState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique id per emitted event
pub type EventId = Uuid;

/// Why a transition happened
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionReason {
    /// Peers reached an invalid verdict on a report
    ConsensusRejected,
    /// Host called `reset_validation_state`
    Reset,
}

/// A player's validation state changed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationStateChangedEvent {
    pub event_id: EventId,
    pub player_id: PlayerId,
    pub previous: ValidationState,
    pub current: ValidationState,
    pub failure_count: u32,
    /// Report sequence whose verdict caused the change
    pub sequence: Option<SequenceNumber>,
    pub reason: TransitionReason,
    /// Engine clock time (seconds)
    pub occurred_at: f64,
}

impl ValidationStateChangedEvent {
    pub fn new(
        player_id: PlayerId,
        transition: &Transition,
        sequence: Option<SequenceNumber>,
        reason: TransitionReason,
        occurred_at: f64,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            player_id,
            previous: transition.previous,
            current: transition.current,
            failure_count: transition.failure_count,
            sequence,
            reason,
            occurred_at,
        }
    }
}

/// A player crossed the kick threshold
///
/// The engine never disconnects anyone; the host decides what a kick means.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerKickedEvent {
    pub event_id: EventId,
    pub player_id: PlayerId,
    pub failure_count: u32,
    pub sequence: Option<SequenceNumber>,
    pub occurred_at: f64,
}

/// Envelope for everything the engine publishes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValidationEvent {
    StateChanged(ValidationStateChangedEvent),
    PlayerKicked(PlayerKickedEvent),
}

impl ValidationEvent {
    /// Events describing `transition`, empty when nothing changed
    pub fn from_transition(
        player_id: PlayerId,
        transition: &Transition,
        sequence: Option<SequenceNumber>,
        reason: TransitionReason,
        occurred_at: f64,
    ) -> Vec<ValidationEvent> {
        if !transition.changed() {
            return Vec::new();
        }

        let mut events = vec![ValidationEvent::StateChanged(
            ValidationStateChangedEvent::new(player_id, transition, sequence, reason, occurred_at),
        )];
        if transition.kicked() {
            events.push(ValidationEvent::PlayerKicked(PlayerKickedEvent {
                event_id: Uuid::new_v4(),
                player_id,
                failure_count: transition.failure_count,
                sequence,
                occurred_at,
            }));
        }
        events
    }

    pub fn event_id(&self) -> EventId {
        match self {
            ValidationEvent::StateChanged(e) => e.event_id,
            ValidationEvent::PlayerKicked(e) => e.event_id,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        match self {
            ValidationEvent::StateChanged(e) => e.player_id,
            ValidationEvent::PlayerKicked(e) => e.player_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ValidationEvent::StateChanged(_) => "StateChanged",
            ValidationEvent::PlayerKicked(_) => "PlayerKicked",
        }
    }
}
