//! Event-to-client routing engine.
//!
//! [`NotificationRouter`] subscribes to the event bus and fans each
//! [`LockerEvent`] out to connected browser clients. Every event is
//! broadcast to all connections -- the dashboard, locker grid, and overtime
//! list all watch the same stream -- and warning events are additionally
//! pushed to the affected user's own connections so their session view can
//! surface the banner immediately.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use lokr_events::LockerEvent;

use crate::ws::WsManager;

/// Event types that are also delivered directly to the affected user.
const USER_TARGETED_EVENTS: [&str; 2] = ["usage.warning", "usage.takeover_warning"];

/// Routes locker events to WebSocket clients.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    /// Create a new router with the given WebSocket manager.
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](lokr_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<LockerEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver a single event to the connected clients.
    async fn route_event(&self, event: &LockerEvent) {
        let frame = serde_json::json!({
            "type": "event",
            "event_type": event.event_type,
            "locker_id": event.locker_id,
            "payload": event.payload,
            "timestamp": event.timestamp,
        });
        let message = Message::Text(frame.to_string().into());

        self.ws_manager.broadcast(message).await;

        if USER_TARGETED_EVENTS.contains(&event.event_type.as_str()) {
            if let Some(user_id) = event.user_id {
                // Distinct frame type so the client can render the banner
                // without filtering the shared dashboard stream.
                let warning = serde_json::json!({
                    "type": "warning",
                    "event_type": event.event_type,
                    "locker_id": event.locker_id,
                    "payload": event.payload,
                    "timestamp": event.timestamp,
                });
                let delivered = self
                    .ws_manager
                    .send_to_user(user_id, Message::Text(warning.to_string().into()))
                    .await;
                tracing::debug!(
                    user_id,
                    event_type = %event.event_type,
                    delivered,
                    "Warning pushed to user connections"
                );
            }
        }
    }
}
