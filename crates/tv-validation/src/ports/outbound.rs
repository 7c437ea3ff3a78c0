//! Driven ports (outbound dependencies)
//!
//! All outbound calls are synchronous and must not block: the engine runs
//! inside the host's network-receive and tick callbacks.

use crate::domain::{BodyHandle, Vec3};
use crate::events::ValidationEvent;

/// External orbital-mechanics solver
///
/// The engine never integrates gravity itself; it asks for the acceleration
/// a body would feel at a position, including every nearby massive body the
/// solver knows about.
pub trait GravityModel: Send + Sync {
    /// Gravitational acceleration (m/s²) felt by `body` at `position`
    ///
    /// Returns `None` when the handle no longer refers to a live body. The
    /// engine treats that as "no prediction available" and fails open.
    fn acceleration_at(&self, body: BodyHandle, position: &Vec3) -> Option<Vec3>;

    /// Whether the handle still refers to a live body
    fn is_live(&self, body: BodyHandle) -> bool {
        self.acceleration_at(body, &Vec3::zeros()).is_some()
    }
}

/// Clock for the rolling failure window
pub trait TimeSource: Send + Sync {
    /// Current session time in seconds
    fn now(&self) -> f64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Observer for validation state transitions
///
/// Publishers are invoked after the engine lock is released, in
/// subscription order.
pub trait ValidationEventPublisher: Send + Sync {
    fn publish(&self, event: ValidationEvent);
}
