//! Broadcast channel for monitor events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The monitor
//! service publishes a [`MonitorEvent`] for every state change and each
//! WebSocket connection holds its own receiver.

use tokio::sync::broadcast;

use super::MonitorEvent;

/// Channel capacity used by [`EventBus::default`].
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Broadcast bus for [`MonitorEvent`]s.
///
/// When the ring buffer is full the oldest events are dropped for lagging
/// receivers; the registry itself remains the source of truth.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers reached; with no receivers the
    /// event is dropped.
    pub fn publish(&self, event: MonitorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}
