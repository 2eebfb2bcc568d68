//! Models for the `locker_usage` table.
//!
//! A usage row is one continuous occupancy of a locker by a user. While
//! `end_time` is null the session is active; ending it (normal release or
//! admin takeover) is terminal and exclusive. The two warning flags only
//! ever transition false→true, which is what makes the sweep idempotent.

use lokr_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `locker_usage` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LockerUsage {
    pub id: DbId,
    pub user_id: DbId,
    pub locker_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration_minutes: i32,
    pub warning_13h_sent: bool,
    pub warning_27h_sent: bool,
    pub taken_by_admin: bool,
    pub admin_takeover_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// An active session joined with occupant and locker details.
///
/// Used by the periodic sweep and the admin overtime listing; carries
/// everything needed to assemble a warning email without further queries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActiveUsage {
    pub id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    pub user_email: String,
    pub user_nim: Option<String>,
    pub locker_id: DbId,
    pub locker_code: String,
    pub start_time: Timestamp,
    pub warning_13h_sent: bool,
    pub warning_27h_sent: bool,
}

/// A closed session row in a user's usage history.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsageHistoryEntry {
    pub id: DbId,
    pub locker_id: DbId,
    pub locker_code: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration_minutes: i32,
    pub taken_by_admin: bool,
}
