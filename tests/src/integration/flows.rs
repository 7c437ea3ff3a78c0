//! # Integration Test Flows
//!
//! Several peers, each with its own engine, validating the same players.
//!
//! ## Flows Tested:
//!
//! 1. **Report → vote → consensus**: every peer predicts, votes, and receives
//!    every other peer's vote
//! 2. **Noisy reports**: jitter and burns at 5-20 Hz never cost an honest
//!    player its trust
//! 3. **Kick delivery**: events reach a broadcast subscriber in order
//! 4. **Hot reconfiguration**: tolerance changes apply to the next check
//! 5. **Membership churn**: unregistering voters shrinks the quorum
//! 6. **Full session**: the scripted orbit simulation with a cheater

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tokio::sync::broadcast::error::RecvError;
    use tokio::time::timeout;

    use tv_sim::{Simulation, SimulationConfig};
    use tv_validation::{
        BodyHandle, BroadcastEventPublisher, ConsensusVerdict, ManualTimeSource,
        PhysicsValidationEngine, PlayerId, PositionReport, UniformGravity, ValidationApi,
        ValidationConfig, ValidationEvent, ValidationState, ValidationVote, Vec3, VoteOutcome,
    };

    type Engine = PhysicsValidationEngine<UniformGravity, ManualTimeSource>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Peer {
        id: PlayerId,
        engine: Engine,
        clock: Arc<ManualTimeSource>,
    }

    /// `count` peers over one gravity field, each knowing every player
    fn peers(count: u64, gravity: Arc<UniformGravity>) -> Vec<Peer> {
        let bodies: Vec<BodyHandle> = (0..count).map(|_| gravity.spawn_body()).collect();

        (1..=count)
            .map(|id| {
                let clock = Arc::new(ManualTimeSource::new(0.0));
                let engine = PhysicsValidationEngine::with_clock(
                    ValidationConfig::default(),
                    Arc::clone(&gravity),
                    Arc::clone(&clock),
                )
                .unwrap();
                for (player, body) in (1..=count).zip(&bodies) {
                    engine.register_player(PlayerId(player), *body).unwrap();
                }
                Peer {
                    id: PlayerId(id),
                    engine,
                    clock,
                }
            })
            .collect()
    }

    /// Exact free fall from rest at `height`
    fn free_fall(player: u64, sequence: u64, t: f64, height: f64) -> PositionReport {
        PositionReport::new(
            PlayerId(player),
            sequence,
            t,
            Vec3::new(0.0, 0.0, height - 0.5 * 9.8 * t * t),
            Vec3::new(0.0, 0.0, -9.8 * t),
        )
    }

    /// Reports every `1 / rate` seconds from a ship that burns `thrust`
    /// during `burn` (sequence numbers) and falls freely otherwise
    ///
    /// Each report carries the thrust applied since the previous one, and
    /// its position is off by up to `jitter` metres per axis.
    fn manoeuvre(
        player: u64,
        rate: f64,
        reports: u64,
        burn: std::ops::Range<u64>,
        thrust: Vec3,
        jitter: f64,
        rng: &mut StdRng,
    ) -> Vec<PositionReport> {
        let mass = ValidationConfig::default().player_mass;
        let gravity = Vec3::new(0.0, 0.0, -9.8);
        let dt = 1.0 / rate;
        let mut position = Vec3::new(0.0, 0.0, 2_000.0);
        let mut velocity = Vec3::zeros();

        (0..reports)
            .map(|sequence| {
                let applied = if burn.contains(&sequence) {
                    thrust
                } else {
                    Vec3::zeros()
                };
                if sequence > 0 {
                    let acceleration = gravity + applied / mass;
                    position += velocity * dt + acceleration * (0.5 * dt * dt);
                    velocity += acceleration * dt;
                }
                let noise = Vec3::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                );
                PositionReport::new(
                    PlayerId(player),
                    sequence,
                    sequence as f64 * dt,
                    position + noise,
                    velocity,
                )
                .with_thrust(applied)
            })
            .collect()
    }

    /// Stream `reports` through every peer and assert each vote is valid
    fn assert_stream_trusted(peers: &[Peer], reports: &[PositionReport], label: &str) {
        for report in reports {
            let votes = broadcast_report(peers, report);
            assert_eq!(votes.len(), peers.len() - 1);
            assert!(
                votes.iter().all(|v| v.is_valid),
                "{label} seq {}: {votes:?}",
                report.sequence
            );
            deliver(peers, &votes);
        }

        let Some(first) = reports.first() else {
            return;
        };
        for peer in peers.iter().filter(|p| p.id != first.player_id) {
            let summary = peer.engine.player_summary(first.player_id).unwrap();
            assert_eq!(summary.state, ValidationState::Trusted, "{label}");
            assert_eq!(summary.successes, reports.len() as u64, "{label}");
        }
    }

    /// One report fanned out to every peer; returns the votes it produced
    fn broadcast_report(peers: &[Peer], report: &PositionReport) -> Vec<ValidationVote> {
        let mut votes = Vec::new();
        for peer in peers {
            peer.clock.set(report.timestamp);
            if peer.id == report.player_id {
                peer.engine.add_position_report(report.clone());
            } else if let Some(vote) = peer.engine.process_report(peer.id, report.clone()) {
                votes.push(vote);
            }
        }
        votes
    }

    fn deliver(peers: &[Peer], votes: &[ValidationVote]) -> Vec<VoteOutcome> {
        peers
            .iter()
            .flat_map(|peer| {
                votes
                    .iter()
                    .map(|vote| peer.engine.submit_validation_vote(vote.clone()))
            })
            .collect()
    }

    // =============================================================================
    // REPORT → VOTE → CONSENSUS
    // =============================================================================

    #[test]
    fn test_free_fall_stream_accepted_by_every_peer() {
        let gravity = Arc::new(UniformGravity::earth());
        let peers = peers(4, gravity);

        for sequence in 0..10 {
            let report = free_fall(1, sequence, sequence as f64 * 0.5, 2_000.0);
            let votes = broadcast_report(&peers, &report);

            assert_eq!(votes.len(), 3);
            assert!(votes.iter().all(|v| v.is_valid), "seq {sequence}: {votes:?}");
            deliver(&peers, &votes);
        }

        for peer in &peers {
            let summary = peer.engine.player_summary(PlayerId(1)).unwrap();
            assert_eq!(summary.state, ValidationState::Trusted);
            assert_eq!(summary.resolved_sequence, Some(9));
            assert_eq!(summary.successes, 10);
            assert_eq!(summary.history_len, 10);
        }
    }

    #[test]
    fn test_teleport_rejected_by_every_peer() {
        let gravity = Arc::new(UniformGravity::earth());
        let peers = peers(4, gravity);

        for sequence in 0..3 {
            let report = free_fall(2, sequence, sequence as f64, 2_000.0);
            let votes = broadcast_report(&peers, &report);
            deliver(&peers, &votes);
        }

        let mut jump = free_fall(2, 3, 3.0, 2_000.0);
        jump.position.x += 250.0;
        let votes = broadcast_report(&peers, &jump);

        assert_eq!(votes.len(), 3);
        assert!(votes.iter().all(|v| !v.is_valid));
        assert!(votes.iter().all(|v| (v.position_error - 250.0).abs() < 1e-6));

        let outcomes = deliver(&peers, &votes);
        let verdicts = outcomes
            .iter()
            .filter_map(|o| match o {
                VoteOutcome::Resolved { result, state } => Some((result.verdict(), *state)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(verdicts.len(), 4);
        assert!(verdicts
            .iter()
            .all(|v| *v == (ConsensusVerdict::Invalid, ValidationState::Suspect)));
    }

    // =============================================================================
    // NOISY REPORTS
    // =============================================================================

    #[test]
    fn test_jittered_stream_stays_trusted_at_report_rates() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for rate in [5.0, 10.0, 20.0] {
            let peers = peers(4, Arc::new(UniformGravity::earth()));
            let reports = manoeuvre(1, rate, 60, 0..0, Vec3::zeros(), 0.3, &mut rng);
            assert_stream_trusted(&peers, &reports, &format!("{rate} Hz"));
        }
    }

    #[test]
    fn test_burn_onset_and_cutoff_stay_trusted() {
        let mut rng = StdRng::seed_from_u64(0xb0b);
        let sideways = Vec3::new(100_000.0, 0.0, 0.0);

        for rate in [0.2, 5.0, 10.0, 20.0] {
            let peers = peers(4, Arc::new(UniformGravity::earth()));
            let reports = manoeuvre(1, rate, 40, 15..30, sideways, 0.2, &mut rng);
            assert_stream_trusted(&peers, &reports, &format!("{rate} Hz"));
        }
    }

    // =============================================================================
    // KICK DELIVERY
    // =============================================================================

    #[tokio::test]
    async fn test_broadcast_subscriber_receives_kick() {
        let gravity = Arc::new(UniformGravity::earth());
        let clock = Arc::new(ManualTimeSource::new(0.0));
        let engine = PhysicsValidationEngine::with_clock(
            ValidationConfig::default(),
            Arc::clone(&gravity),
            Arc::clone(&clock),
        )
        .unwrap();
        for id in 1..=3 {
            engine
                .register_player(PlayerId(id), gravity.spawn_body())
                .unwrap();
        }

        let publisher = Arc::new(BroadcastEventPublisher::new());
        let mut events = publisher.subscribe();
        engine.subscribe(publisher.clone());

        for sequence in 0..5 {
            clock.advance(1.0);
            for validator in [2, 3] {
                engine.submit_validation_vote(ValidationVote::new(
                    PlayerId(validator),
                    PlayerId(1),
                    sequence,
                    false,
                    60.0,
                    0.0,
                ));
            }
        }
        assert!(engine.should_kick_player(PlayerId(1)));
        drop(engine);
        drop(publisher);

        let mut received = Vec::new();
        loop {
            match timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Ok(event)) => received.push(event),
                Ok(Err(RecvError::Closed)) => break,
                Ok(Err(RecvError::Lagged(n))) => panic!("lagged by {n}"),
                Err(_) => panic!("timed out waiting for events"),
            }
        }

        let types: Vec<&str> = received.iter().map(ValidationEvent::event_type).collect();
        assert_eq!(
            types,
            vec!["StateChanged", "StateChanged", "StateChanged", "PlayerKicked"]
        );
        let states: Vec<ValidationState> = received
            .iter()
            .filter_map(|e| match e {
                ValidationEvent::StateChanged(change) => Some(change.current),
                ValidationEvent::PlayerKicked(_) => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                ValidationState::Suspect,
                ValidationState::Flagged,
                ValidationState::Kicked
            ]
        );
    }

    // =============================================================================
    // HOT RECONFIGURATION
    // =============================================================================

    #[test]
    fn test_config_update_applies_to_next_check() {
        let gravity = Arc::new(UniformGravity::new(Vec3::zeros()));
        let peers = peers(2, gravity);
        let engine = &peers[0].engine;

        engine.add_position_report(PositionReport::new(
            PlayerId(2),
            0,
            0.0,
            Vec3::zeros(),
            Vec3::zeros(),
        ));
        let drifted = Vec3::new(6.0, 0.0, 0.0);

        // 5 + 2 * 1
        assert!(engine.validate_position(PlayerId(2), &drifted, 1.0));

        let strict = ValidationConfig {
            base_position_tolerance: 1.0,
            ..ValidationConfig::default()
        };
        engine.update_config(strict).unwrap();
        assert!(!engine.validate_position(PlayerId(2), &drifted, 1.0));
        assert_eq!(engine.position_tolerance(1.0, PlayerId(2)), 3.0);

        let broken = ValidationConfig {
            consensus_threshold: 1.5,
            ..ValidationConfig::default()
        };
        assert!(engine.update_config(broken).is_err());
        assert_eq!(engine.config().base_position_tolerance, 1.0);
    }

    // =============================================================================
    // MEMBERSHIP CHURN
    // =============================================================================

    #[test]
    fn test_unregistering_voters_shrinks_quorum() {
        let gravity = Arc::new(UniformGravity::earth());
        let peers = peers(4, gravity);
        let engine = &peers[0].engine;

        let outcome = engine.submit_validation_vote(ValidationVote::new(
            PlayerId(2),
            PlayerId(1),
            0,
            false,
            30.0,
            0.0,
        ));
        let VoteOutcome::Pending(result) = outcome else {
            panic!("expected pending, got {outcome:?}");
        };
        assert_eq!(result.required_votes, 2);

        engine.unregister_player(PlayerId(3));
        engine.unregister_player(PlayerId(4));

        let result = engine.calculate_consensus(PlayerId(1), 0);
        assert_eq!(result.required_votes, 1);
        assert_eq!(result.invalid_vote_count, 1);
        assert_eq!(result.verdict(), ConsensusVerdict::Invalid);

        let late = engine.submit_validation_vote(ValidationVote::new(
            PlayerId(3),
            PlayerId(1),
            0,
            true,
            0.0,
            0.0,
        ));
        assert_eq!(late, VoteOutcome::UnknownPlayer);
    }

    // =============================================================================
    // FULL SESSION
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_orbit_session_kicks_cheater() {
        let config = SimulationConfig {
            peers: 7,
            cheater: Some(3),
            ..SimulationConfig::default()
        };
        let mut simulation = Simulation::new(config, ValidationConfig::default()).unwrap();

        let publisher = Arc::new(BroadcastEventPublisher::new());
        let mut events = publisher.subscribe();
        assert!(simulation.subscribe(PlayerId(1), publisher.clone()));
        drop(publisher);

        let listener = tokio::spawn(async move {
            let mut kicked = Vec::new();
            while let Ok(event) = events.recv().await {
                if let ValidationEvent::PlayerKicked(kick) = event {
                    kicked.push(kick.player_id);
                }
            }
            kicked
        });

        let stats = tokio::task::spawn_blocking(move || {
            let stats = simulation.run().clone();
            let honest_states: Vec<_> = [1, 2, 4, 5, 6, 7]
                .into_iter()
                .flat_map(|peer| {
                    [1, 2, 4, 5, 6, 7]
                        .into_iter()
                        .map(move |player| (peer, player))
                })
                .map(|(peer, player)| simulation.state_seen_by(PlayerId(peer), PlayerId(player)))
                .collect();
            (stats, honest_states)
        })
        .await
        .unwrap();

        let kicked = timeout(Duration::from_secs(5), listener)
            .await
            .unwrap()
            .unwrap();

        let (stats, honest_states) = stats;
        assert_eq!(kicked, vec![PlayerId(3)]);
        assert_eq!(stats.kicked_by(PlayerId(3)).len(), 6);
        assert!(stats.kicks.iter().all(|k| k.player == PlayerId(3)));
        assert!(honest_states
            .iter()
            .all(|s| *s == Some(ValidationState::Trusted)));
    }
}
