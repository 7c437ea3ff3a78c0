//! Multi-peer session
//!
//! Every peer runs its own engine over the shared world. Each tick:
//!
//! ```text
//! ships move ──→ reports ──→ every peer: process_report ──→ votes
//!                                                            │
//!            every peer: submit_validation_vote ←────────────┘
//!                                │
//!                 should_kick_player ──→ unregister + despawn
//! ```
//!
//! The network is perfect here: every peer sees every report and vote in
//! the same order. Latency only shows up as jittered RTT samples.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use tv_validation::{
    ManualTimeSource, PhysicsValidationEngine, PlayerId, PointMassField, ValidationApi,
    ValidationConfig, ValidationEventPublisher, ValidationState, ValidationVote, VoteOutcome,
};

use crate::config::SimulationConfig;
use crate::error::SimulationResult;
use crate::world::World;

type PeerEngine = PhysicsValidationEngine<PointMassField, ManualTimeSource>;

/// Window used for the distance-over-time audit (seconds)
const DISTANCE_AUDIT_WINDOW: f64 = 10.0;

pub struct Peer {
    pub id: PlayerId,
    pub engine: PeerEngine,
    clock: Arc<ManualTimeSource>,
    /// Players this peer has kicked from its session
    disconnected: BTreeSet<PlayerId>,
}

impl Peer {
    pub fn has_disconnected(&self, player_id: PlayerId) -> bool {
        self.disconnected.contains(&player_id)
    }
}

/// Kick observed by one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickRecord {
    pub peer: PlayerId,
    pub player: PlayerId,
    pub tick: u64,
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    pub ticks: u64,
    pub reports: u64,
    pub votes_cast: u64,
    pub invalid_votes: u64,
    pub verdicts: u64,
    pub distance_violations: u64,
    pub kicks: Vec<KickRecord>,
}

impl SimulationStats {
    /// Peers that kicked `player`
    pub fn kicked_by(&self, player: PlayerId) -> BTreeSet<PlayerId> {
        self.kicks
            .iter()
            .filter(|k| k.player == player)
            .map(|k| k.peer)
            .collect()
    }
}

pub struct Simulation {
    config: SimulationConfig,
    world: World,
    peers: Vec<Peer>,
    rng: StdRng,
    tick: u64,
    stats: SimulationStats,
}

impl Simulation {
    pub fn new(config: SimulationConfig, validation: ValidationConfig) -> SimulationResult<Self> {
        config.validate()?;
        validation.validate()?;

        let world = World::new(config.peers, validation.player_mass);
        let mut peers = Vec::with_capacity(config.peers as usize);

        for ship in world.ships() {
            let clock = Arc::new(ManualTimeSource::new(0.0));
            let engine = PhysicsValidationEngine::with_clock(
                validation.clone(),
                Arc::clone(world.field()),
                Arc::clone(&clock),
            )?;
            for other in world.ships() {
                engine.register_player(other.player_id, other.body)?;
            }
            peers.push(Peer {
                id: ship.player_id,
                engine,
                clock,
                disconnected: BTreeSet::new(),
            });
        }

        info!(
            peers = config.peers,
            cheater = ?config.cheater,
            "Simulation session created"
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            world,
            peers,
            tick: 0,
            stats: SimulationStats::default(),
        })
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn peer(&self, id: PlayerId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Attach an event listener to one peer's engine
    pub fn subscribe(&self, peer: PlayerId, publisher: Arc<dyn ValidationEventPublisher>) -> bool {
        match self.peer(peer) {
            Some(p) => {
                p.engine.subscribe(publisher);
                true
            }
            None => false,
        }
    }

    /// Run every configured tick
    pub fn run(&mut self) -> &SimulationStats {
        while self.tick < self.config.ticks {
            self.step();
        }
        &self.stats
    }

    /// Advance one tick
    pub fn step(&mut self) {
        self.tick += 1;
        let tick = self.tick;

        self.world.plan_manoeuvres(tick);
        self.world.step(self.config.tick_seconds, self.config.substeps);
        if let Some(cheater) = self.cheater_cheating(tick) {
            self.world.teleport(cheater, self.config.cheat_offset);
        }

        let now = self.world.time();
        let reports = self.world.reports();
        self.stats.reports += reports.len() as u64;

        let mut votes = Vec::new();
        for peer in &self.peers {
            peer.clock.set(now);
            for report in &reports {
                if report.player_id == peer.id || peer.has_disconnected(report.player_id) {
                    continue;
                }
                let rtt = self.rng.gen_range(0.02..0.15);
                peer.engine.update_player_latency(report.player_id, rtt);

                if let Some(vote) = peer.engine.process_report(peer.id, report.clone()) {
                    votes.push(self.falsify(peer.id, vote));
                }
            }
        }
        // Peers also keep their own history for local prediction
        for peer in &self.peers {
            if let Some(own) = reports.iter().find(|r| r.player_id == peer.id) {
                peer.engine.add_position_report(own.clone());
            }
        }

        self.stats.votes_cast += votes.len() as u64;
        self.stats.invalid_votes += votes.iter().filter(|v| !v.is_valid).count() as u64;

        for peer in &self.peers {
            for vote in &votes {
                if let VoteOutcome::Resolved { .. } = peer.engine.submit_validation_vote(vote.clone())
                {
                    self.stats.verdicts += 1;
                }
            }
        }

        self.audit_distances();
        self.enforce_kicks(tick);
        self.stats.ticks = tick;
    }

    fn cheater_cheating(&self, tick: u64) -> Option<PlayerId> {
        self.config
            .cheater
            .filter(|_| tick >= self.config.cheat_from_tick)
            .map(PlayerId)
    }

    /// A Byzantine cheater votes every honest report invalid
    fn falsify(&self, voter: PlayerId, mut vote: ValidationVote) -> ValidationVote {
        let lying = self.config.byzantine_votes
            && self.config.cheater == Some(voter.as_u64())
            && vote.target_player_id != voter;
        if lying {
            vote.is_valid = false;
        }
        vote
    }

    fn audit_distances(&mut self) {
        let Some(observer) = self.peers.first() else {
            return;
        };
        for player in observer.engine.registered_players() {
            if player == observer.id {
                continue;
            }
            if !observer
                .engine
                .validate_distance_over_time(player, DISTANCE_AUDIT_WINDOW)
            {
                self.stats.distance_violations += 1;
                debug!(observer = %observer.id, %player, "Distance audit failed");
            }
        }
    }

    /// Host-side consequence of a kick: disconnect, and despawn once every
    /// other peer agrees
    fn enforce_kicks(&mut self, tick: u64) {
        for peer in &mut self.peers {
            let kicked: Vec<PlayerId> = peer
                .engine
                .registered_players()
                .into_iter()
                .filter(|p| *p != peer.id && peer.engine.should_kick_player(*p))
                .collect();

            for player in kicked {
                warn!(peer = %peer.id, %player, tick, "Disconnecting kicked player");
                peer.engine.unregister_player(player);
                peer.disconnected.insert(player);
                self.stats.kicks.push(KickRecord {
                    peer: peer.id,
                    player,
                    tick,
                });
            }
        }

        let ids: Vec<PlayerId> = self.peers.iter().map(|p| p.id).collect();
        for player in ids {
            let everyone_agrees = self
                .peers
                .iter()
                .filter(|p| p.id != player)
                .all(|p| p.has_disconnected(player));
            if everyone_agrees && self.world.despawn(player) {
                info!(%player, tick, "Player removed from the session");
                self.peers.retain(|p| p.id != player);
            }
        }
    }

    /// State of `player` as seen by `peer`
    pub fn state_seen_by(&self, peer: PlayerId, player: PlayerId) -> Option<ValidationState> {
        let peer = self.peer(peer)?;
        if peer.has_disconnected(player) {
            return Some(ValidationState::Kicked);
        }
        Some(peer.engine.get_validation_state(player))
    }
}
