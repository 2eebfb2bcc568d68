//! Event bus and outbound notification infrastructure.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; every locker state change flows through it.
//! - [`LockerEvent`] -- the canonical domain event envelope.
//! - [`delivery`] -- SMTP email delivery for warning and confiscation mail.

pub mod bus;
pub mod delivery;

pub use bus::{EventBus, LockerEvent};
pub use delivery::email::{EmailConfig, EmailError, LockerMailer};
