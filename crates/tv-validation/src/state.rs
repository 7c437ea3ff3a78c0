use crate::domain::{
    ConsensusAggregator, HistoryStore, PlayerId, PlayerRegistry, PlayerSnapshot, PlayerValidation,
    ValidationState,
};
use std::collections::HashMap;

/// Everything the engine guards behind its single lock
pub struct EngineState {
    /// Player → gravity body
    pub registry: PlayerRegistry,
    /// Per-player report buffers
    pub history: HistoryStore,
    /// Votes keyed player → sequence → validator
    pub consensus: ConsensusAggregator,
    /// Per-player state machine
    pub validation: HashMap<PlayerId, PlayerValidation>,
    /// Measured round-trip latency (seconds)
    pub latency: HashMap<PlayerId, f64>,
}

impl EngineState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            history: HistoryStore::new(history_capacity),
            consensus: ConsensusAggregator::new(),
            validation: HashMap::new(),
            latency: HashMap::new(),
        }
    }

    /// Create empty per-player entries for a newly registered player
    pub fn track(&mut self, player_id: PlayerId) {
        self.history.track(player_id);
        self.validation.entry(player_id).or_default();
    }

    /// Drop every per-player entry, including votes the player cast
    pub fn purge(&mut self, player_id: PlayerId) {
        self.history.remove(player_id);
        self.consensus.purge_player(player_id);
        self.validation.remove(&player_id);
        self.latency.remove(&player_id);
    }

    /// Consistent copy of a player's inputs, `None` when unregistered
    pub fn snapshot(&self, player_id: PlayerId) -> Option<PlayerSnapshot> {
        let body = self.registry.body(player_id)?;
        Some(PlayerSnapshot {
            player_id,
            body: Some(body),
            latency_rtt: self.latency_of(player_id),
            history: self.history.history(player_id),
        })
    }

    pub fn latency_of(&self, player_id: PlayerId) -> f64 {
        self.latency.get(&player_id).copied().unwrap_or(0.0)
    }

    pub fn state_of(&self, player_id: PlayerId) -> ValidationState {
        self.validation
            .get(&player_id)
            .map(PlayerValidation::state)
            .unwrap_or_default()
    }

    /// Peers that may vote on `target`
    pub fn eligible_validators(&self, target: PlayerId) -> usize {
        self.registry.eligible_validators(target)
    }
}
