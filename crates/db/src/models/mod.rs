//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Projection structs for joined queries used by handlers and the sweep

pub mod locker;
pub mod usage;
pub mod user;
