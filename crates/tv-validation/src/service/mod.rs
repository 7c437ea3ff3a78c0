//! Physics validation engine
//!
//! One instance per peer. Every mutation goes through the single state lock;
//! the standalone checks copy a `PlayerSnapshot` out under a read lock and
//! compute without holding anything. `process_report` is the exception: it
//! judges a report and appends it under one write lock, so every vote is
//! cast against exactly the history the report extends. Writes re-check
//! registration, so work done for a player that was unregistered in between
//! is dropped. Events are published after the lock is released.

use crate::config::ValidationConfig;
use crate::domain::{
    BodyHandle, ConsensusResult, ConsensusVerdict, EscalationPolicy, FailureAccounting,
    HistoryInsert, PlayerId, PlayerSnapshot, PositionReport, SequenceNumber, ToleranceCalculator,
    TrajectoryValidator, Transition, ValidationState, ValidationVote, ValidatorId, Vec3,
    VoteRecord,
};
use crate::error::{ValidationError, ValidationResult};
use crate::events::{TransitionReason, ValidationEvent};
use crate::metrics;
use crate::ports::{
    GravityModel, PlayerSummary, ReportOutcome, SystemTimeSource, TimeSource, ValidationApi,
    ValidationEventPublisher, VoteOutcome,
};
use crate::state::EngineState;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Trajectory validation engine
pub struct PhysicsValidationEngine<G, C = SystemTimeSource>
where
    G: GravityModel,
    C: TimeSource,
{
    config: RwLock<Arc<ValidationConfig>>,
    state: RwLock<EngineState>,
    gravity: Arc<G>,
    clock: Arc<C>,
    publishers: RwLock<Vec<Arc<dyn ValidationEventPublisher>>>,
}

impl<G: GravityModel> PhysicsValidationEngine<G, SystemTimeSource> {
    /// Engine on wall-clock time
    pub fn new(config: ValidationConfig, gravity: Arc<G>) -> ValidationResult<Self> {
        Self::with_clock(config, gravity, Arc::new(SystemTimeSource))
    }
}

impl<G, C> PhysicsValidationEngine<G, C>
where
    G: GravityModel,
    C: TimeSource,
{
    pub fn with_clock(
        config: ValidationConfig,
        gravity: Arc<G>,
        clock: Arc<C>,
    ) -> ValidationResult<Self> {
        config.validate()?;
        let state = EngineState::new(config.max_history_size);

        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            state: RwLock::new(state),
            gravity,
            clock,
            publishers: RwLock::new(Vec::new()),
        })
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<ValidationConfig> {
        Arc::clone(&self.config.read())
    }

    /// Hot-reload the configuration
    ///
    /// A smaller `max_history_size` trims every buffer immediately.
    pub fn update_config(&self, config: ValidationConfig) -> ValidationResult<()> {
        config.validate()?;
        let capacity = config.max_history_size;
        *self.config.write() = Arc::new(config);
        self.state.write().history.set_capacity(capacity);

        info!(max_history_size = capacity, "Validation config reloaded");
        Ok(())
    }

    /// Add an observer for state transitions
    pub fn subscribe(&self, publisher: Arc<dyn ValidationEventPublisher>) {
        self.publishers.write().push(publisher);
    }

    pub fn gravity(&self) -> &Arc<G> {
        &self.gravity
    }

    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    pub fn registered_players(&self) -> Vec<PlayerId> {
        self.state.read().registry.players().collect()
    }

    pub fn failure_accounting(&self, player_id: PlayerId) -> Option<FailureAccounting> {
        self.state
            .read()
            .validation
            .get(&player_id)
            .map(|machine| machine.accounting())
    }

    pub fn player_summary(&self, player_id: PlayerId) -> Option<PlayerSummary> {
        let state = self.state.read();
        let body = state.registry.body(player_id)?;
        let machine = state.validation.get(&player_id).cloned().unwrap_or_default();
        let history = state.history.get(player_id);

        Some(PlayerSummary {
            player_id,
            body,
            state: machine.state(),
            accounting: machine.accounting(),
            successes: machine.successes(),
            latency_rtt: state.latency_of(player_id),
            history_len: history.map(|h| h.len()).unwrap_or(0),
            last_sequence: history.and_then(|h| h.last_sequence()),
            resolved_sequence: state.consensus.resolved_sequence(player_id),
        })
    }

    fn snapshot(&self, player_id: PlayerId) -> Option<PlayerSnapshot> {
        self.state.read().snapshot(player_id)
    }

    fn insert_report(state: &mut EngineState, report: PositionReport) -> ReportOutcome {
        let player_id = report.player_id;
        if !state.registry.contains(player_id) {
            return ReportOutcome::UnknownPlayer;
        }
        match state.history.add_report(player_id, report) {
            Some(HistoryInsert::Appended) => ReportOutcome::Accepted,
            Some(HistoryInsert::Backfilled | HistoryInsert::Dropped) => ReportOutcome::Stale,
            None => ReportOutcome::UnknownPlayer,
        }
    }

    fn log_report(player_id: PlayerId, sequence: u64, outcome: ReportOutcome) {
        metrics::record_report(outcome.as_str());
        match outcome {
            ReportOutcome::Accepted => debug!(%player_id, sequence, "Position report accepted"),
            ReportOutcome::Stale => debug!(%player_id, sequence, "Stale position report"),
            ReportOutcome::UnknownPlayer => {
                debug!(%player_id, sequence, "Report for unknown player dropped")
            }
        }
    }

    fn publish(&self, events: Vec<ValidationEvent>) {
        if events.is_empty() {
            return;
        }
        let publishers = self.publishers.read().clone();
        for event in events {
            for publisher in &publishers {
                publisher.publish(event.clone());
            }
        }
    }

    /// Apply a decided verdict; caller holds the state lock
    fn apply_verdict(
        state: &mut EngineState,
        player_id: PlayerId,
        verdict: ConsensusVerdict,
        now: f64,
        policy: &EscalationPolicy,
    ) -> Transition {
        let machine = state.validation.entry(player_id).or_default();
        match verdict {
            ConsensusVerdict::Invalid => machine.record_failure(now, policy),
            ConsensusVerdict::Valid | ConsensusVerdict::Pending => {
                machine.record_success(now, policy)
            }
        }
    }

    fn log_transition(player_id: PlayerId, transition: &Transition, sequence: Option<u64>) {
        if !transition.changed() {
            return;
        }
        metrics::record_state_transition(transition.current.as_str());

        match transition.current {
            ValidationState::Kicked => {
                metrics::record_player_kicked();
                error!(
                    %player_id,
                    ?sequence,
                    failure_count = transition.failure_count,
                    "Player kicked for repeated invalid trajectories"
                );
            }
            ValidationState::Suspect | ValidationState::Flagged => {
                warn!(
                    %player_id,
                    ?sequence,
                    previous = %transition.previous,
                    state = %transition.current,
                    failure_count = transition.failure_count,
                    "Validation state escalated"
                );
            }
            ValidationState::Trusted => {
                info!(%player_id, previous = %transition.previous, "Validation state reset");
            }
        }
    }

    /// Record a decided result and apply it; caller holds the state lock
    fn resolve(
        state: &mut EngineState,
        result: &ConsensusResult,
        verdict: ConsensusVerdict,
        now: f64,
        policy: &EscalationPolicy,
    ) -> (Transition, Vec<ValidationEvent>) {
        let player_id = result.player_id;
        state.consensus.mark_resolved(player_id, result.sequence);
        let transition = Self::apply_verdict(state, player_id, verdict, now, policy);

        metrics::record_consensus_resolved(match verdict {
            ConsensusVerdict::Valid => "valid",
            ConsensusVerdict::Invalid => "invalid",
            ConsensusVerdict::Pending => "pending",
        });
        info!(
            %player_id,
            sequence = result.sequence,
            ?verdict,
            valid = result.valid_vote_count,
            invalid = result.invalid_vote_count,
            "Consensus resolved"
        );
        Self::log_transition(player_id, &transition, Some(result.sequence));

        let events = ValidationEvent::from_transition(
            player_id,
            &transition,
            Some(result.sequence),
            TransitionReason::ConsensusRejected,
            now,
        );
        (transition, events)
    }
}

impl<G, C> ValidationApi for PhysicsValidationEngine<G, C>
where
    G: GravityModel,
    C: TimeSource,
{
    fn register_player(&self, player_id: PlayerId, body: BodyHandle) -> ValidationResult<()> {
        if !self.gravity.is_live(body) {
            warn!(%player_id, %body, "Registering player with a body the gravity model does not know");
        }

        let count = {
            let mut state = self.state.write();
            if !state.registry.register(player_id, body) {
                return Err(ValidationError::PlayerAlreadyRegistered { player_id });
            }
            state.track(player_id);
            state.registry.len()
        };

        metrics::set_registered_players(count);
        info!(%player_id, %body, "Player registered");
        Ok(())
    }

    fn unregister_player(&self, player_id: PlayerId) -> bool {
        let count = {
            let mut state = self.state.write();
            if state.registry.unregister(player_id).is_none() {
                return false;
            }
            state.purge(player_id);
            state.registry.len()
        };

        metrics::set_registered_players(count);
        info!(%player_id, "Player unregistered");
        true
    }

    fn update_player_latency(&self, player_id: PlayerId, rtt_seconds: f64) -> bool {
        if !rtt_seconds.is_finite() || rtt_seconds < 0.0 {
            warn!(%player_id, rtt_seconds, "Ignoring invalid latency sample");
            return false;
        }

        let mut state = self.state.write();
        if !state.registry.contains(player_id) {
            return false;
        }
        state.latency.insert(player_id, rtt_seconds);
        true
    }

    fn add_position_report(&self, report: PositionReport) -> ReportOutcome {
        let player_id = report.player_id;
        let sequence = report.sequence;

        let outcome = Self::insert_report(&mut self.state.write(), report);

        Self::log_report(player_id, sequence, outcome);
        outcome
    }

    fn process_report(
        &self,
        validator_id: ValidatorId,
        report: PositionReport,
    ) -> Option<ValidationVote> {
        let player_id = report.player_id;
        let sequence = report.sequence;
        let config = self.config();
        let validator = TrajectoryValidator::new(&config, self.gravity.as_ref());

        // Judge and append under one write lock so a concurrent report for
        // the same player can neither slip in between nor be skipped
        let (outcome, vote) = {
            let mut state = self.state.write();
            let snapshot = state.snapshot(player_id)?;
            let vote = (validator_id != player_id)
                .then(|| validator.build_vote(validator_id, &snapshot, &report));
            (Self::insert_report(&mut state, report), vote)
        };

        Self::log_report(player_id, sequence, outcome);
        match (outcome, vote) {
            (ReportOutcome::Accepted, Some(vote)) => {
                debug!(
                    validator = %validator_id,
                    target = %vote.target_player_id,
                    sequence = vote.sequence,
                    is_valid = vote.is_valid,
                    position_error = vote.position_error,
                    "Vote cast"
                );
                Some(vote)
            }
            _ => None,
        }
    }

    fn history(&self, player_id: PlayerId) -> Vec<PositionReport> {
        self.state.read().history.history(player_id)
    }

    fn last_report(&self, player_id: PlayerId) -> Option<PositionReport> {
        self.state.read().history.last_report(player_id).cloned()
    }

    fn validate_position(&self, player_id: PlayerId, reported: &Vec3, timestamp: f64) -> bool {
        let Some(snapshot) = self.snapshot(player_id) else {
            return false;
        };
        let config = self.config();
        TrajectoryValidator::new(&config, self.gravity.as_ref())
            .check_position(&snapshot, reported, timestamp)
            .passed
    }

    fn validate_thrust(
        &self,
        player_id: PlayerId,
        thrust: &Vec3,
        position: &Vec3,
        timestamp: f64,
    ) -> bool {
        let Some(snapshot) = self.snapshot(player_id) else {
            return false;
        };
        let config = self.config();
        TrajectoryValidator::new(&config, self.gravity.as_ref())
            .check_thrust(&snapshot, thrust, position, timestamp)
            .passed
    }

    fn validate_distance_over_time(&self, player_id: PlayerId, time_window: f64) -> bool {
        let Some(snapshot) = self.snapshot(player_id) else {
            return false;
        };
        let config = self.config();
        let check = TrajectoryValidator::new(&config, self.gravity.as_ref())
            .check_distance_over_time(&snapshot, time_window);
        if !check.passed {
            debug!(
                %player_id,
                travelled = check.travelled,
                min = check.min_possible,
                max = check.max_possible,
                "Implausible distance over time"
            );
        }
        check.passed
    }

    fn predict_position(&self, player_id: PlayerId, delta_time: f64) -> Option<Vec3> {
        let snapshot = self.snapshot(player_id)?;
        let last = snapshot.last()?;
        let config = self.config();
        let validator = TrajectoryValidator::new(&config, self.gravity.as_ref());
        Some(
            validator
                .predictor()
                .predict(last, snapshot.body, delta_time)
                .position,
        )
    }

    fn position_tolerance(&self, delta_time: f64, player_id: PlayerId) -> f64 {
        let latency = self.state.read().latency_of(player_id);
        let config = self.config();
        ToleranceCalculator::new(&config).position_tolerance(delta_time, latency)
    }

    fn thrust_tolerance(&self) -> f64 {
        let config = self.config();
        ToleranceCalculator::new(&config).thrust_tolerance()
    }

    fn submit_validation_vote(&self, vote: ValidationVote) -> VoteOutcome {
        let config = self.config();
        let policy = EscalationPolicy::from(config.as_ref());
        let now = self.clock.now();
        let validator_id = vote.validator_id;
        let target = vote.target_player_id;
        let sequence = vote.sequence;

        let (outcome, events) = {
            let mut state = self.state.write();
            if !state.registry.contains(target) || !state.registry.contains(validator_id) {
                (VoteOutcome::UnknownPlayer, Vec::new())
            } else if validator_id == target {
                (VoteOutcome::SelfVote, Vec::new())
            } else if state.state_of(target).is_terminal() {
                (VoteOutcome::AlreadyKicked, Vec::new())
            } else if state.consensus.submit(vote) == VoteRecord::Superseded {
                (VoteOutcome::Superseded, Vec::new())
            } else {
                let eligible = state.eligible_validators(target);
                let result = state.consensus.calculate(
                    target,
                    sequence,
                    config.consensus_threshold,
                    eligible,
                );
                match result.verdict() {
                    ConsensusVerdict::Pending => (VoteOutcome::Pending(result), Vec::new()),
                    verdict => {
                        let (transition, events) =
                            Self::resolve(&mut state, &result, verdict, now, &policy);
                        (
                            VoteOutcome::Resolved {
                                result,
                                state: transition.current,
                            },
                            events,
                        )
                    }
                }
            }
        };

        metrics::record_vote(outcome.as_str());
        debug!(
            validator = %validator_id,
            %target,
            sequence,
            outcome = outcome.as_str(),
            "Vote submitted"
        );
        self.publish(events);
        outcome
    }

    fn calculate_consensus(
        &self,
        player_id: PlayerId,
        sequence: SequenceNumber,
    ) -> ConsensusResult {
        let threshold = self.config().consensus_threshold;
        let state = self.state.read();
        state.consensus.calculate(
            player_id,
            sequence,
            threshold,
            state.eligible_validators(player_id),
        )
    }

    fn is_consensus_reached(&self, player_id: PlayerId) -> bool {
        let threshold = self.config().consensus_threshold;
        let state = self.state.read();
        state.consensus.is_consensus_reached(
            player_id,
            threshold,
            state.eligible_validators(player_id),
        )
    }

    fn get_validation_state(&self, player_id: PlayerId) -> ValidationState {
        self.state.read().state_of(player_id)
    }

    fn should_kick_player(&self, player_id: PlayerId) -> bool {
        self.get_validation_state(player_id).is_terminal()
    }

    fn update_validation_state(
        &self,
        player_id: PlayerId,
        result: &ConsensusResult,
    ) -> ValidationState {
        let config = self.config();
        let policy = EscalationPolicy::from(config.as_ref());
        let now = self.clock.now();

        let (current, events) = {
            let mut state = self.state.write();
            if !state.registry.contains(player_id) {
                return ValidationState::default();
            }
            if result.player_id != player_id {
                warn!(%player_id, subject = %result.player_id, "Consensus result for another player ignored");
                return state.state_of(player_id);
            }
            if state
                .consensus
                .resolved_sequence(player_id)
                .is_some_and(|resolved| result.sequence <= resolved)
            {
                return state.state_of(player_id);
            }
            match result.verdict() {
                ConsensusVerdict::Pending => return state.state_of(player_id),
                verdict => {
                    let (transition, events) =
                        Self::resolve(&mut state, result, verdict, now, &policy);
                    (transition.current, events)
                }
            }
        };

        self.publish(events);
        current
    }

    fn reset_validation_state(&self, player_id: PlayerId) -> bool {
        let now = self.clock.now();
        let events = {
            let mut state = self.state.write();
            if !state.registry.contains(player_id) {
                return false;
            }
            let transition = state.validation.entry(player_id).or_default().reset();
            Self::log_transition(player_id, &transition, None);
            ValidationEvent::from_transition(
                player_id,
                &transition,
                None,
                TransitionReason::Reset,
                now,
            )
        };

        self.publish(events);
        true
    }
}
