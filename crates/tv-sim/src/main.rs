//! Trajectory validation session runner
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`TV_LOG_LEVEL`, `TV_JSON_LOGS`)
//! 2. Load session and engine configuration from the environment
//! 3. Attach an event listener to the first peer
//! 4. Run every tick, then print a summary

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use tv_sim::{Simulation, SimulationConfig};
use tv_telemetry::{init_telemetry, TelemetryConfig};
use tv_validation::{BroadcastEventPublisher, PlayerId, ValidationConfig, ValidationEvent};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::for_component("sim")).context("initializing telemetry")?;

    let sim_config = SimulationConfig::from_env();
    let validation_config = ValidationConfig::from_env();
    info!(?sim_config, "Starting trajectory validation session");

    let mut simulation =
        Simulation::new(sim_config, validation_config).context("building simulation")?;

    let publisher = Arc::new(BroadcastEventPublisher::new());
    let mut events = publisher.subscribe();
    simulation.subscribe(PlayerId(1), publisher.clone());
    drop(publisher);

    let listener = tokio::spawn(async move {
        let mut kicked = Vec::new();
        loop {
            match events.recv().await {
                Ok(ValidationEvent::StateChanged(event)) => {
                    info!(
                        player = %event.player_id,
                        previous = %event.previous,
                        current = %event.current,
                        failures = event.failure_count,
                        "Peer 1 observed state change"
                    );
                }
                Ok(ValidationEvent::PlayerKicked(event)) => {
                    error!(player = %event.player_id, "Peer 1 observed kick");
                    kicked.push(event.player_id);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        kicked
    });

    // The engines are synchronous; keep the integrator off the async workers
    let stats = tokio::task::spawn_blocking(move || {
        let stats = simulation.run().clone();
        drop(simulation);
        stats
    })
    .await
    .context("simulation task panicked")?;

    let kicked = listener.await.context("event listener panicked")?;

    info!(
        ticks = stats.ticks,
        reports = stats.reports,
        votes = stats.votes_cast,
        invalid_votes = stats.invalid_votes,
        verdicts = stats.verdicts,
        distance_violations = stats.distance_violations,
        kicks = stats.kicks.len(),
        "Session finished"
    );
    for record in &stats.kicks {
        info!(peer = %record.peer, player = %record.player, tick = record.tick, "Kick");
    }
    info!(?kicked, "Kicks seen by peer 1");

    #[cfg(feature = "metrics")]
    {
        match tv_telemetry::gather_metrics() {
            Ok(text) => println!("{text}"),
            Err(e) => warn!(error = %e, "Failed to gather metrics"),
        }
    }

    Ok(())
}
