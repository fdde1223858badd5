//! Domain events emitted after a transition commits.
//!
//! Subscribers (notifiers, audit sinks) receive `{entity kind, id, new
//! status, timestamp}` and nothing more. Publishing never blocks or fails the
//! transition: with no subscribers, or a lagging one, the event is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::workflow::report::ClearanceStage;
use crate::workflow::types::{ClearanceStatus, EntityKind};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// A committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Kind of entity that changed.
    pub entity_kind: EntityKind,
    /// Its id.
    pub entity_id: Uuid,
    /// Status after the change, or `"deleted"`. Report clearances carry
    /// `<STAGE>:<STATUS>`, e.g. `FINAL_CLEARANCE:CLEARED`.
    pub new_status: String,
    /// When the change committed.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Build an event stamped now.
    #[must_use]
    pub fn now(entity_kind: EntityKind, entity_id: Uuid, new_status: impl Into<String>) -> Self {
        Self {
            entity_kind,
            entity_id,
            new_status: new_status.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Build the event for a report clearance sub-flow.
    #[must_use]
    pub fn clearance(report_id: Uuid, stage: ClearanceStage, status: ClearanceStatus) -> Self {
        Self::now(
            EntityKind::Report,
            report_id,
            format!("{}:{}", stage.as_str(), status.as_str()),
        )
    }
}

/// Fan-out publisher over a broadcast channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    /// Create a publisher with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns the number of subscribers reached.
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let publisher = EventPublisher::default();
        let mut rx = publisher.subscribe();
        let id = Uuid::new_v4();

        let reached = publisher.publish(DomainEvent::now(EntityKind::Event, id, "COMPLETED"));
        assert_eq!(reached, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.entity_id, id);
        assert_eq!(event.entity_kind, EntityKind::Event);
        assert_eq!(event.new_status, "COMPLETED");
    }

    #[test]
    fn test_clearance_event_names_stage() {
        let id = Uuid::new_v4();
        let event = DomainEvent::clearance(id, ClearanceStage::First, ClearanceStatus::Cleared);
        assert_eq!(event.entity_kind, EntityKind::Report);
        assert_eq!(event.entity_id, id);
        assert_eq!(event.new_status, "FIRST_CLEARANCE:CLEARED");
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let publisher = EventPublisher::new(4);
        assert_eq!(
            publisher.publish(DomainEvent::now(EntityKind::Report, Uuid::new_v4(), "DRAFT")),
            0
        );
    }
}
