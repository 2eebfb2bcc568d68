//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`LockerEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the application. All
//! events travel through the one channel, so subscribers observe events for
//! any given session in the order they were published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use lokr_core::types::DbId;

// ---------------------------------------------------------------------------
// LockerEvent
// ---------------------------------------------------------------------------

/// A domain event describing a locker state change.
///
/// Constructed via [`LockerEvent::new`] and enriched with the builder
/// methods [`with_locker`](LockerEvent::with_locker),
/// [`with_user`](LockerEvent::with_user), and
/// [`with_payload`](LockerEvent::with_payload).
///
/// Event names in use: `locker.updated`, `overtime.changed`,
/// `usage.warning`, `usage.takeover_warning`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerEvent {
    /// Dot-separated event name, e.g. `"locker.updated"`.
    pub event_type: String,

    /// The locker the event concerns, when there is one.
    pub locker_id: Option<DbId>,

    /// The user affected by the event, when there is one. Warning events
    /// are additionally pushed to this user's own connections.
    pub user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl LockerEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            locker_id: None,
            user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the subject locker to the event.
    pub fn with_locker(mut self, locker_id: DbId) -> Self {
        self.locker_id = Some(locker_id);
        self
    }

    /// Attach the affected user to the event.
    pub fn with_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`LockerEvent`].
pub struct EventBus {
    sender: broadcast::Sender<LockerEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: LockerEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<LockerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = LockerEvent::new("locker.updated")
            .with_locker(3)
            .with_user(7)
            .with_payload(serde_json::json!({"status": "available"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "locker.updated");
        assert_eq!(received.locker_id, Some(3));
        assert_eq!(received.user_id, Some(7));
        assert_eq!(received.payload["status"], "available");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(LockerEvent::new("overtime.changed"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "overtime.changed");
        assert_eq!(e2.event_type, "overtime.changed");
    }

    #[tokio::test]
    async fn events_for_one_session_arrive_in_publish_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(LockerEvent::new("locker.updated").with_locker(5));
        bus.publish(LockerEvent::new("usage.warning").with_locker(5));
        bus.publish(LockerEvent::new("overtime.changed").with_locker(5));

        assert_eq!(rx.recv().await.unwrap().event_type, "locker.updated");
        assert_eq!(rx.recv().await.unwrap().event_type, "usage.warning");
        assert_eq!(rx.recv().await.unwrap().event_type, "overtime.changed");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        // No subscribers -- this must not panic.
        bus.publish(LockerEvent::new("locker.updated"));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = LockerEvent::new("locker.updated");
        assert!(event.locker_id.is_none());
        assert!(event.user_id.is_none());
        assert!(event.payload.is_object());
    }
}
