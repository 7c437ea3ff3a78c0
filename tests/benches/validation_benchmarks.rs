//! # Trajectory Validation Benchmarks
//!
//! | Path | Work per call |
//! |------|---------------|
//! | Position check | One prediction over an N-body field |
//! | Vote construction | Position + thrust check |
//! | Distance audit | Full history window scan |
//! | Consensus tally | One pass over the vote set |
//! | Engine report path | Snapshot, checks, history insert |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

use tv_validation::domain::{tally, PlayerSnapshot, TrajectoryValidator};
use tv_validation::{
    BodyHandle, ManualTimeSource, PhysicsValidationEngine, PlayerId, PointMassField, PositionReport,
    ValidationApi, ValidationConfig, ValidationVote, Vec3,
};

/// Field with one planet plus `ships` bodies scattered around it
fn crowded_field(ships: usize, rng: &mut StdRng) -> (PointMassField, Vec<BodyHandle>) {
    let field = PointMassField::new();
    field.spawn_body(1.0e20, Vec3::zeros());
    let handles = (0..ships)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(-2.0e5..2.0e5),
                rng.gen_range(-2.0e5..2.0e5),
                rng.gen_range(-1.0e4..1.0e4),
            );
            field.spawn_body(50_000.0, position)
        })
        .collect();
    (field, handles)
}

fn coasting_history(player: PlayerId, reports: u64) -> Vec<PositionReport> {
    (0..reports)
        .map(|seq| {
            let t = seq as f64 * 0.1;
            PositionReport::new(
                player,
                seq,
                t,
                Vec3::new(100_000.0 + 250.0 * t, 0.0, 0.0),
                Vec3::new(250.0, 0.0, 0.0),
            )
        })
        .collect()
}

// ============================================================================
// Validator
// ============================================================================

fn bench_position_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator-position");
    let config = ValidationConfig::default();
    let mut rng = StdRng::seed_from_u64(1);

    for bodies in [1usize, 16, 128, 1024] {
        let (field, handles) = crowded_field(bodies, &mut rng);
        let validator = TrajectoryValidator::new(&config, &field);
        let snapshot = PlayerSnapshot {
            player_id: PlayerId(1),
            body: handles.first().copied(),
            latency_rtt: 0.08,
            history: coasting_history(PlayerId(1), 2),
        };
        let reported = Vec3::new(100_075.0, 0.0, 0.0);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("bodies", bodies), &bodies, |b, _| {
            b.iter(|| black_box(validator.check_position(&snapshot, &reported, 0.3)))
        });
    }
    group.finish();
}

fn bench_build_vote(c: &mut Criterion) {
    let config = ValidationConfig::default();
    let mut rng = StdRng::seed_from_u64(2);
    let (field, handles) = crowded_field(64, &mut rng);
    let validator = TrajectoryValidator::new(&config, &field);
    let snapshot = PlayerSnapshot {
        player_id: PlayerId(1),
        body: handles.first().copied(),
        latency_rtt: 0.05,
        history: coasting_history(PlayerId(1), 10),
    };
    let report = PositionReport::new(
        PlayerId(1),
        10,
        1.0,
        Vec3::new(100_250.0, 0.0, 0.0),
        Vec3::new(250.0, 0.0, 0.0),
    )
    .with_thrust(Vec3::new(5_000.0, 0.0, 0.0));

    c.bench_function("validator-build-vote", |b| {
        b.iter(|| black_box(validator.build_vote(PlayerId(2), &snapshot, &report)))
    });
}

fn bench_distance_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator-distance");
    let config = ValidationConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let (field, handles) = crowded_field(16, &mut rng);
    let validator = TrajectoryValidator::new(&config, &field);

    for history in [10u64, 100, 1000] {
        let snapshot = PlayerSnapshot {
            player_id: PlayerId(1),
            body: handles.first().copied(),
            latency_rtt: 0.0,
            history: coasting_history(PlayerId(1), history),
        };
        group.throughput(Throughput::Elements(history));
        group.bench_with_input(
            BenchmarkId::new("history", history),
            &history,
            |b, &history| {
                let window = history as f64 * 0.1;
                b.iter(|| black_box(validator.check_distance_over_time(&snapshot, window)))
            },
        );
    }
    group.finish();
}

// ============================================================================
// Consensus
// ============================================================================

fn bench_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus-tally");
    let mut rng = StdRng::seed_from_u64(4);

    for validators in [4usize, 32, 256, 2048] {
        let votes: Vec<ValidationVote> = (0..validators)
            .map(|i| {
                ValidationVote::new(
                    PlayerId(i as u64 + 2),
                    PlayerId(1),
                    0,
                    rng.gen_bool(0.8),
                    rng.gen_range(0.0..20.0),
                    rng.gen_range(0.0..500.0),
                )
            })
            .collect();

        group.throughput(Throughput::Elements(validators as u64));
        group.bench_with_input(
            BenchmarkId::new("validators", validators),
            &votes,
            |b, votes| b.iter(|| black_box(tally(PlayerId(1), 0, votes.iter(), 0.67, validators))),
        );
    }
    group.finish();
}

// ============================================================================
// Engine
// ============================================================================

fn bench_engine_report_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-report-path");
    group.measurement_time(Duration::from_secs(5));

    let field = Arc::new(PointMassField::new());
    field.spawn_body(1.0e20, Vec3::zeros());
    let clock = Arc::new(ManualTimeSource::new(0.0));
    let engine =
        PhysicsValidationEngine::with_clock(ValidationConfig::default(), Arc::clone(&field), clock)
            .expect("default config is valid");
    for id in 1..=32u64 {
        let body = field.spawn_body(50_000.0, Vec3::new(100_000.0 + id as f64 * 500.0, 0.0, 0.0));
        engine
            .register_player(PlayerId(id), body)
            .expect("fresh player");
    }

    let mut sequence = 0u64;
    group.bench_function("process_report", |b| {
        b.iter(|| {
            let t = sequence as f64 * 0.1;
            let report = PositionReport::new(
                PlayerId(1),
                sequence,
                t,
                Vec3::new(100_500.0, 250.0 * t, 0.0),
                Vec3::new(0.0, 250.0, 0.0),
            );
            sequence += 1;
            black_box(engine.process_report(PlayerId(2), report))
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_position_check,
    bench_build_vote,
    bench_distance_audit,
    bench_tally,
    bench_engine_report_path
);
criterion_main!(benches);
