//! Ports layer (Hexagonal Architecture)
//!
//! - inbound: `ValidationApi`, what the host calls
//! - outbound: gravity model, clock and event sinks the engine drives

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
