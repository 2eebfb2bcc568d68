//! Event-to-client routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus and pushes every
//! locker event to connected WebSocket clients.

pub mod router;

pub use router::NotificationRouter;
