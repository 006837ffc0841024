//! Change notifications
//!
//! Every successful store mutation publishes [`StoreEvent::BlacklistUpdated`].
//! Publishing never blocks and never waits for receivers; consumers are
//! expected to re-load the state when they see the event.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of undelivered events a receiver may fall behind by
pub const DEFAULT_CAPACITY: usize = 64;

/// Outbound notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StoreEvent {
    /// Patterns or list mode changed
    BlacklistUpdated,
}

/// Fire-and-forget broadcast of [`StoreEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus whose receivers may lag by `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event; having no receivers is not an error
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }

    /// Register a new receiver; it only sees events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_receivers() {
        let bus = EventBus::new();
        bus.publish(StoreEvent::BlacklistUpdated);

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscriber_sees_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(StoreEvent::BlacklistUpdated);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::BlacklistUpdated);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_wire_form() {
        let json = serde_json::to_string(&StoreEvent::BlacklistUpdated).unwrap();
        assert_eq!(json, r#"{"action":"blacklistUpdated"}"#);
    }
}
