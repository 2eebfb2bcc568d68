//! Models for the `users` table.
//!
//! Account management and authentication live outside this service; the
//! locker backend only needs enough of a user record to attribute sessions
//! and address warning emails.

use lokr_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    /// Student identification number, when known.
    pub nim: Option<String>,
    pub email: String,
    pub created_at: Timestamp,
}
