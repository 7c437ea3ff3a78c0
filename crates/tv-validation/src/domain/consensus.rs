//! Votes and consensus aggregation
//!
//! Votes are keyed `player -> sequence -> validator`. A validator
//! resubmitting for the same key overwrites its earlier vote, so duplicate
//! delivery never double counts.
//!
//! ## Threshold comparison
//!
//! Ratios are compared at whole-percent precision, the way the threshold is
//! configured: `round(100 · valid / total) >= round(100 · threshold)`. With
//! the default 0.67 this makes 2 of 3 a supermajority and 1 of 3 not.
//!
//! ## Verdicts
//!
//! ```text
//! total < required_votes                          → Pending
//! valid share meets threshold                     → Valid
//! threshold unreachable even if every outstanding
//!   eligible peer votes valid                     → Invalid
//! otherwise                                       → Pending
//! ```

use super::report::{PlayerId, SequenceNumber, ValidatorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Pending sequences retained per player before the oldest are dropped
pub const MAX_PENDING_SEQUENCES: usize = 64;

/// One peer's judgement of one report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationVote {
    pub validator_id: ValidatorId,
    pub target_player_id: PlayerId,
    pub sequence: SequenceNumber,
    pub is_valid: bool,
    /// Distance between reported and predicted position (m)
    pub position_error: f64,
    /// Thrust left unexplained by the reported thrust (N)
    pub thrust_error: f64,
}

impl ValidationVote {
    pub fn new(
        validator_id: ValidatorId,
        target_player_id: PlayerId,
        sequence: SequenceNumber,
        is_valid: bool,
        position_error: f64,
        thrust_error: f64,
    ) -> Self {
        Self {
            validator_id,
            target_player_id,
            sequence,
            is_valid,
            position_error,
            thrust_error,
        }
    }
}

/// Outcome of reducing a vote set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusVerdict {
    /// Not enough votes to decide either way
    Pending,
    /// Supermajority judged the report legitimate
    Valid,
    /// Supermajority can no longer be reached
    Invalid,
}

/// Tally for one (player, sequence) pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub player_id: PlayerId,
    pub sequence: SequenceNumber,
    /// Quorum present and valid share meets the threshold
    pub consensus_reached: bool,
    pub valid_vote_count: usize,
    pub invalid_vote_count: usize,
    pub average_position_error: f64,
    /// Votes needed before any verdict is drawn
    pub required_votes: usize,
    /// Eligible peers that have not voted yet
    pub outstanding_votes: usize,
    threshold_percent: u32,
}

impl ConsensusResult {
    pub fn total_votes(&self) -> usize {
        self.valid_vote_count + self.invalid_vote_count
    }

    pub fn quorum_met(&self) -> bool {
        self.total_votes() >= self.required_votes.max(1)
    }

    pub fn verdict(&self) -> ConsensusVerdict {
        if !self.quorum_met() {
            return ConsensusVerdict::Pending;
        }
        if self.consensus_reached {
            return ConsensusVerdict::Valid;
        }

        let best_case_valid = self.valid_vote_count + self.outstanding_votes;
        let best_case_total = self.total_votes() + self.outstanding_votes;
        if meets_threshold(best_case_valid, best_case_total, self.threshold_percent) {
            ConsensusVerdict::Pending
        } else {
            ConsensusVerdict::Invalid
        }
    }
}

/// Threshold as a whole percentage
pub fn threshold_percent(threshold: f64) -> u32 {
    (threshold.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Whether `valid` of `total` votes meets the threshold
pub fn meets_threshold(valid: usize, total: usize, threshold_percent: u32) -> bool {
    if total == 0 {
        return false;
    }
    let share = (valid as f64 * 100.0 / total as f64).round() as u32;
    share >= threshold_percent
}

/// Smallest vote count out of `eligible` that can carry the threshold
pub fn required_votes(eligible: usize, threshold: f64) -> usize {
    let percent = threshold_percent(threshold);
    let eligible = eligible.max(1);
    (1..=eligible)
        .find(|&k| meets_threshold(k, eligible, percent))
        .unwrap_or(eligible)
}

/// Tally a vote set
pub fn tally<'a>(
    player_id: PlayerId,
    sequence: SequenceNumber,
    votes: impl IntoIterator<Item = &'a ValidationVote>,
    threshold: f64,
    eligible: usize,
) -> ConsensusResult {
    let mut valid = 0usize;
    let mut invalid = 0usize;
    let mut error_sum = 0.0;

    for vote in votes {
        if vote.is_valid {
            valid += 1;
        } else {
            invalid += 1;
        }
        error_sum += vote.position_error;
    }

    let total = valid + invalid;
    let percent = threshold_percent(threshold);
    let required = required_votes(eligible, threshold);

    ConsensusResult {
        player_id,
        sequence,
        consensus_reached: total >= required && meets_threshold(valid, total, percent),
        valid_vote_count: valid,
        invalid_vote_count: invalid,
        average_position_error: if total == 0 {
            0.0
        } else {
            error_sum / total as f64
        },
        required_votes: required,
        outstanding_votes: eligible.saturating_sub(total),
        threshold_percent: percent,
    }
}

/// Result of recording one vote
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteRecord {
    /// First vote from this validator for the key
    Added,
    /// Replaced this validator's earlier vote
    Replaced,
    /// Sequence at or below the resolved one; ignored
    Superseded,
}

type VoteSet = BTreeMap<ValidatorId, ValidationVote>;

/// Vote table for every subject player
#[derive(Debug, Default)]
pub struct ConsensusAggregator {
    votes: HashMap<PlayerId, BTreeMap<SequenceNumber, VoteSet>>,
    resolved: HashMap<PlayerId, SequenceNumber>,
}

impl ConsensusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote, overwriting the validator's earlier vote for the key
    pub fn submit(&mut self, vote: ValidationVote) -> VoteRecord {
        let target = vote.target_player_id;
        if self
            .resolved
            .get(&target)
            .is_some_and(|&resolved| vote.sequence <= resolved)
        {
            return VoteRecord::Superseded;
        }

        let sequences = self.votes.entry(target).or_default();
        let previous = sequences
            .entry(vote.sequence)
            .or_default()
            .insert(vote.validator_id, vote);

        while sequences.len() > MAX_PENDING_SEQUENCES {
            sequences.pop_first();
        }

        if previous.is_some() {
            VoteRecord::Replaced
        } else {
            VoteRecord::Added
        }
    }

    /// Tally the votes for one (player, sequence) pair
    pub fn calculate(
        &self,
        player_id: PlayerId,
        sequence: SequenceNumber,
        threshold: f64,
        eligible: usize,
    ) -> ConsensusResult {
        let votes = self
            .votes
            .get(&player_id)
            .and_then(|sequences| sequences.get(&sequence))
            .into_iter()
            .flat_map(|set| set.values());
        tally(player_id, sequence, votes, threshold, eligible)
    }

    /// Most recent sequence with any votes
    pub fn latest_sequence(&self, player_id: PlayerId) -> Option<SequenceNumber> {
        self.votes
            .get(&player_id)
            .and_then(|sequences| sequences.keys().next_back().copied())
    }

    /// Consensus check against the most recent voted sequence
    pub fn is_consensus_reached(&self, player_id: PlayerId, threshold: f64, eligible: usize) -> bool {
        self.latest_sequence(player_id)
            .map(|seq| {
                self.calculate(player_id, seq, threshold, eligible)
                    .consensus_reached
            })
            .unwrap_or(false)
    }

    /// Mark a sequence decided; older vote sets are dropped
    ///
    /// The resolved set itself is kept so its result stays recomputable.
    pub fn mark_resolved(&mut self, player_id: PlayerId, sequence: SequenceNumber) {
        let resolved = self.resolved.entry(player_id).or_insert(sequence);
        *resolved = (*resolved).max(sequence);
        let floor = *resolved;

        if let Some(sequences) = self.votes.get_mut(&player_id) {
            sequences.retain(|&seq, _| seq >= floor);
        }
    }

    pub fn resolved_sequence(&self, player_id: PlayerId) -> Option<SequenceNumber> {
        self.resolved.get(&player_id).copied()
    }

    /// Drop every vote about `player_id` and every vote cast by it
    pub fn purge_player(&mut self, player_id: PlayerId) {
        self.votes.remove(&player_id);
        self.resolved.remove(&player_id);

        for sequences in self.votes.values_mut() {
            for set in sequences.values_mut() {
                set.remove(&player_id);
            }
            sequences.retain(|_, set| !set.is_empty());
        }
    }

    /// Number of votes recorded for a player across all sequences
    pub fn vote_count(&self, player_id: PlayerId) -> usize {
        self.votes
            .get(&player_id)
            .map(|sequences| sequences.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }
}
