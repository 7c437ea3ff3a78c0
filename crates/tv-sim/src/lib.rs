//! # tv-sim
//!
//! Scripted multi-peer session for the trajectory validation engine.
//!
//! A ring of ships orbits a small planet. Every peer flies one ship and runs
//! its own [`PhysicsValidationEngine`](tv_validation::PhysicsValidationEngine)
//! over the shared gravity field. One configurable peer cheats: from a given
//! tick it skips its ship ahead without thrust to explain it, and optionally
//! votes every honest report invalid. Honest peers should converge on kicking
//! it while never flagging each other.
//!
//! ## Modules
//!
//! - `config` - Session parameters (`TV_SIM_*` environment variables)
//! - `world` - Planet, ships and the integrator standing in for host physics
//! - `session` - Report and vote exchange between peers, kick enforcement

pub mod config;
pub mod error;
pub mod session;
pub mod world;

pub use config::SimulationConfig;
pub use error::{SimulationError, SimulationResult};
pub use session::{KickRecord, Peer, Simulation, SimulationStats};
pub use world::{Ship, World};
