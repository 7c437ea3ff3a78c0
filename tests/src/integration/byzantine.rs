//! # Byzantine Voting Scenarios
//!
//! Validators that lie, collude, or deliver their votes in arbitrary order.
//!
//! The guarantee under test: once honest voters alone can carry the
//! threshold, no delivery order lets a lying minority decide the verdict.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use tv_validation::domain::required_votes;
    use tv_validation::{
        ConsensusVerdict, ManualTimeSource, PhysicsValidationEngine, PlayerId, UniformGravity,
        ValidationApi, ValidationConfig, ValidationState, ValidationVote, VoteOutcome,
    };

    type Engine = PhysicsValidationEngine<UniformGravity, ManualTimeSource>;

    const THRESHOLD: f64 = 0.67;

    fn engine(players: u64) -> (Engine, Arc<ManualTimeSource>) {
        let gravity = Arc::new(UniformGravity::earth());
        let clock = Arc::new(ManualTimeSource::new(0.0));
        let engine = PhysicsValidationEngine::with_clock(
            ValidationConfig::default(),
            Arc::clone(&gravity),
            Arc::clone(&clock),
        )
        .unwrap();
        for id in 1..=players {
            engine
                .register_player(PlayerId(id), gravity.spawn_body())
                .unwrap();
        }
        (engine, clock)
    }

    fn vote(validator: u64, target: u64, sequence: u64, is_valid: bool) -> ValidationVote {
        ValidationVote::new(
            PlayerId(validator),
            PlayerId(target),
            sequence,
            is_valid,
            if is_valid { 1.0 } else { 80.0 },
            0.0,
        )
    }

    fn verdicts(outcomes: &[VoteOutcome]) -> Vec<ConsensusVerdict> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                VoteOutcome::Resolved { result, .. } => Some(result.verdict()),
                _ => None,
            })
            .collect()
    }

    /// Voters `2..=eligible+1`; the first `honest` of them tell the truth
    fn electorate() -> impl Strategy<Value = Vec<(u64, bool)>> {
        (2usize..=12).prop_flat_map(|eligible| {
            let honest = required_votes(eligible, THRESHOLD);
            let voters: Vec<(u64, bool)> = (0..eligible)
                .map(|i| (i as u64 + 2, i < honest))
                .collect();
            Just(voters).prop_shuffle()
        })
    }

    // =============================================================================
    // DELIVERY ORDER
    // =============================================================================

    proptest! {
        #[test]
        fn prop_lying_minority_cannot_frame(voters in electorate()) {
            let (engine, _) = engine(voters.len() as u64 + 1);

            let outcomes: Vec<VoteOutcome> = voters
                .iter()
                .map(|&(id, honest)| engine.submit_validation_vote(vote(id, 1, 0, honest)))
                .collect();

            prop_assert_eq!(verdicts(&outcomes), vec![ConsensusVerdict::Valid]);
            prop_assert_eq!(engine.get_validation_state(PlayerId(1)), ValidationState::Trusted);
        }

        #[test]
        fn prop_lying_minority_cannot_rescue(voters in electorate()) {
            let (engine, _) = engine(voters.len() as u64 + 1);

            // Honest voters reject, liars vouch
            let outcomes: Vec<VoteOutcome> = voters
                .iter()
                .map(|&(id, honest)| engine.submit_validation_vote(vote(id, 1, 0, !honest)))
                .collect();

            prop_assert_eq!(verdicts(&outcomes), vec![ConsensusVerdict::Invalid]);
            prop_assert_eq!(engine.get_validation_state(PlayerId(1)), ValidationState::Suspect);
        }
    }

    // =============================================================================
    // SEEDED CAMPAIGNS
    // =============================================================================

    #[test]
    fn test_single_liar_over_many_rounds() {
        let (engine, clock) = engine(7);
        let liar = 7;
        let mut rng = StdRng::seed_from_u64(0x7a11);

        for sequence in 0..200 {
            clock.advance(rng.gen_range(0.5..1.5));
            let target = rng.gen_range(1..=6);

            let mut ballot: Vec<ValidationVote> = (1..=7)
                .filter(|&id| id != target)
                .map(|id| vote(id, target, sequence, id != liar))
                .collect();
            ballot.shuffle(&mut rng);

            let outcomes: Vec<VoteOutcome> = ballot
                .into_iter()
                .map(|v| engine.submit_validation_vote(v))
                .collect();
            assert_eq!(verdicts(&outcomes), vec![ConsensusVerdict::Valid]);
        }

        for player in 1..=6 {
            assert_eq!(
                engine.get_validation_state(PlayerId(player)),
                ValidationState::Trusted
            );
            let accounting = engine.failure_accounting(PlayerId(player)).unwrap();
            assert_eq!(accounting.failure_count, 0);
        }
    }

    #[test]
    fn test_colluding_pair_cannot_save_cheater() {
        let (engine, clock) = engine(7);
        let cheater = 7;
        let accomplice = 6;
        let mut rng = StdRng::seed_from_u64(42);

        for sequence in 0..5 {
            clock.advance(2.0);
            let mut ballot: Vec<ValidationVote> = (1..=6)
                .map(|id| vote(id, cheater, sequence, id == accomplice))
                .collect();
            // Byzantine peers vouch twice, the second overwriting the first
            ballot.push(vote(accomplice, cheater, sequence, true));
            ballot.shuffle(&mut rng);

            for v in ballot {
                engine.submit_validation_vote(v);
            }
        }

        assert!(engine.should_kick_player(PlayerId(cheater)));
        assert_eq!(
            engine.submit_validation_vote(vote(1, cheater, 5, false)),
            VoteOutcome::AlreadyKicked
        );
    }

    #[test]
    fn test_sparse_failures_never_kick() {
        let (engine, clock) = engine(4);
        let mut rng = StdRng::seed_from_u64(99);

        // One failure every 40 s: each opens a fresh window
        for sequence in 0..12 {
            clock.advance(40.0 + rng.gen_range(0.0..5.0));
            let mut ballot: Vec<ValidationVote> =
                (2..=4).map(|id| vote(id, 1, sequence, false)).collect();
            ballot.shuffle(&mut rng);
            for v in ballot {
                engine.submit_validation_vote(v);
            }
        }

        assert_eq!(
            engine.get_validation_state(PlayerId(1)),
            ValidationState::Suspect
        );
        let accounting = engine.failure_accounting(PlayerId(1)).unwrap();
        assert_eq!(accounting.failure_count, 1);
    }
}
