//! Player registry
//!
//! Maps stable player ids to opaque gravity-model body handles. The engine
//! never owns a body: a handle is an arena index plus generation, and the
//! gravity model decides on every lookup whether it is still live.

use super::report::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Generational handle to a body owned by the gravity model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}v{}", self.index, self.generation)
    }
}

/// Registered players and their bodies
///
/// Ordered map so that iteration (and therefore vote eligibility and
/// logging) is deterministic across peers.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    bodies: BTreeMap<PlayerId, BodyHandle>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player; returns false if the id is already taken
    pub fn register(&mut self, player_id: PlayerId, body: BodyHandle) -> bool {
        if self.bodies.contains_key(&player_id) {
            return false;
        }
        self.bodies.insert(player_id, body);
        true
    }

    pub fn unregister(&mut self, player_id: PlayerId) -> Option<BodyHandle> {
        self.bodies.remove(&player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.bodies.contains_key(&player_id)
    }

    pub fn body(&self, player_id: PlayerId) -> Option<BodyHandle> {
        self.bodies.get(&player_id).copied()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.bodies.keys().copied()
    }

    /// Peers expected to vote on `target` (everyone else, at least one)
    pub fn eligible_validators(&self, target: PlayerId) -> usize {
        let others = self.bodies.len() - usize::from(self.contains(target));
        others.max(1)
    }
}
