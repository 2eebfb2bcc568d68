//! Models for the `lockers` table.

use lokr_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Locker status values stored in the `status` column.
pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_OCCUPIED: &str = "occupied";
pub const STATUS_MAINTENANCE: &str = "maintenance";

/// All valid locker statuses, used for request validation.
pub const VALID_STATUSES: [&str; 3] = [STATUS_AVAILABLE, STATUS_OCCUPIED, STATUS_MAINTENANCE];

/// A row from the `lockers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Locker {
    pub id: DbId,
    pub locker_code: String,
    pub status: String,
    pub current_user_id: Option<DbId>,
    pub location: Option<String>,
    pub occupied_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A locker joined with its current occupant, for the listing endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LockerWithOccupant {
    pub id: DbId,
    pub locker_code: String,
    pub status: String,
    pub current_user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub user_nim: Option<String>,
    pub updated_at: Timestamp,
}

/// DTO for creating a locker.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocker {
    pub locker_code: String,
    pub location: Option<String>,
}
