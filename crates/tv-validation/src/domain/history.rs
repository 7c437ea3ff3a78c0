//! Per-player report history
//!
//! Each registered player owns a bounded ring of reports ordered by sequence
//! number. When the ring is full the oldest report is evicted.
//!
//! INVARIANT: sequence numbers inside one history are non-decreasing. Late
//! (stale) reports are backfilled at their sorted position instead of being
//! appended out of order.

use super::report::{PlayerId, PositionReport, SequenceNumber};
use std::collections::{HashMap, VecDeque};

/// Where an inserted report ended up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryInsert {
    /// Newest report, appended at the back
    Appended,
    /// Stale or duplicate report, inserted at its sorted position
    Backfilled,
    /// Older than everything retained in a full history
    Dropped,
}

impl HistoryInsert {
    /// Whether the report advanced the player's sequence
    pub fn is_fresh(&self) -> bool {
        matches!(self, HistoryInsert::Appended)
    }
}

/// Bounded, sequence-ordered report ring for one player
#[derive(Clone, Debug)]
pub struct ReportHistory {
    reports: VecDeque<PositionReport>,
    capacity: usize,
}

impl ReportHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            reports: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a report, evicting from the front when over capacity
    pub fn push(&mut self, report: PositionReport) -> HistoryInsert {
        let fresh = self
            .reports
            .back()
            .map_or(true, |last| report.sequence > last.sequence);

        let outcome = if fresh {
            self.reports.push_back(report);
            HistoryInsert::Appended
        } else {
            let at = self
                .reports
                .partition_point(|r| r.sequence <= report.sequence);
            if at == 0 && self.reports.len() >= self.capacity {
                return HistoryInsert::Dropped;
            }
            self.reports.insert(at, report);
            HistoryInsert::Backfilled
        };

        self.trim();
        outcome
    }

    /// Change capacity, trimming the oldest reports immediately
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        while self.reports.len() > self.capacity {
            self.reports.pop_front();
        }
    }

    pub fn last(&self) -> Option<&PositionReport> {
        self.reports.back()
    }

    pub fn last_sequence(&self) -> Option<SequenceNumber> {
        self.last().map(|r| r.sequence)
    }

    pub fn get(&self, sequence: SequenceNumber) -> Option<&PositionReport> {
        self.reports.iter().rev().find(|r| r.sequence == sequence)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PositionReport> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first copy of the retained reports
    pub fn to_vec(&self) -> Vec<PositionReport> {
        self.reports.iter().cloned().collect()
    }
}

/// History store for every tracked player
#[derive(Debug)]
pub struct HistoryStore {
    histories: HashMap<PlayerId, ReportHistory>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            histories: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Start tracking a player (idempotent)
    pub fn track(&mut self, player_id: PlayerId) {
        let capacity = self.capacity;
        self.histories
            .entry(player_id)
            .or_insert_with(|| ReportHistory::with_capacity(capacity));
    }

    /// Stop tracking a player and drop its reports
    pub fn remove(&mut self, player_id: PlayerId) -> Option<ReportHistory> {
        self.histories.remove(&player_id)
    }

    pub fn is_tracked(&self, player_id: PlayerId) -> bool {
        self.histories.contains_key(&player_id)
    }

    /// Add a report for a tracked player
    ///
    /// Returns `None` for an untracked player; late reports after a
    /// disconnect are expected and must not fail the caller.
    pub fn add_report(
        &mut self,
        player_id: PlayerId,
        report: PositionReport,
    ) -> Option<HistoryInsert> {
        self.histories
            .get_mut(&player_id)
            .map(|history| history.push(report))
    }

    /// Oldest-first reports for a player (empty when unknown)
    pub fn history(&self, player_id: PlayerId) -> Vec<PositionReport> {
        self.histories
            .get(&player_id)
            .map(ReportHistory::to_vec)
            .unwrap_or_default()
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&ReportHistory> {
        self.histories.get(&player_id)
    }

    pub fn last_report(&self, player_id: PlayerId) -> Option<&PositionReport> {
        self.histories.get(&player_id).and_then(ReportHistory::last)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hot-reload the per-player capacity
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        for history in self.histories.values_mut() {
            history.set_capacity(self.capacity);
        }
    }
}
