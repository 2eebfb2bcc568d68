//! Domain logic for the smart locker platform.
//!
//! Pure business rules with no database or network dependencies:
//!
//! - [`duration`] -- warning-level assessment for an active occupancy.
//! - [`escalation`] -- which warning email (if any) a sweep must send,
//!   plus the command type handed to the delivery layer.
//! - [`error`] -- domain error taxonomy shared across crates.

pub mod duration;
pub mod error;
pub mod escalation;
pub mod types;
