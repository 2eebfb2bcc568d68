//! Outbound delivery channels.
//!
//! Email is the only external channel; real-time browser delivery goes
//! through the WebSocket layer in the API crate.

pub mod email;
