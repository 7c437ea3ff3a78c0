//! Adapters layer
//!
//! Concrete implementations of the outbound ports.

pub mod clock;
pub mod event_bus;
pub mod gravity;

pub use clock::ManualTimeSource;
pub use event_bus::{BroadcastEventPublisher, InMemoryEventPublisher, DEFAULT_CHANNEL_CAPACITY};
pub use gravity::{BodyArena, PointMass, PointMassField, UniformGravity, GRAVITATIONAL_CONSTANT};
