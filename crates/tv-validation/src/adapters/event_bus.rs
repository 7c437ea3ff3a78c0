//! Event publisher adapters
//!
//! - `InMemoryEventPublisher`: records every event, for tests and polling hosts
//! - `BroadcastEventPublisher`: fans events out over a tokio broadcast channel

use crate::domain::PlayerId;
use crate::events::ValidationEvent;
use crate::ports::ValidationEventPublisher;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default broadcast channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-memory event publisher
pub struct InMemoryEventPublisher {
    events: RwLock<Vec<ValidationEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ValidationEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Players that received a `PlayerKicked` event, in order
    pub fn kicked_players(&self) -> Vec<PlayerId> {
        self.events
            .read()
            .iter()
            .filter_map(|event| match event {
                ValidationEvent::PlayerKicked(kicked) => Some(kicked.player_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl Default for InMemoryEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: ValidationEvent) {
        self.events.write().push(event);
    }
}

/// Broadcast publisher for async listeners
///
/// Publishing never blocks; slow receivers observe `Lagged` on their side.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ValidationEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl BroadcastEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ValidationEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: ValidationEvent) {
        let event_type = event.event_type();
        let player_id = event.player_id();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event_type, %player_id, receivers, "Validation event published");
            }
            Err(_) => {
                warn!(event_type, %player_id, "Validation event dropped (no receivers)");
            }
        }
    }
}
