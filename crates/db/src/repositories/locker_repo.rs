//! Repository for the `lockers` table.
//!
//! Session lifecycle operations that must update a locker and its usage row
//! atomically (checkout, release, takeover) live in
//! [`UsageRepo`](crate::repositories::UsageRepo); this repository covers the
//! locker resource itself.

use sqlx::PgPool;

use lokr_core::types::DbId;

use crate::models::locker::{CreateLocker, Locker, LockerWithOccupant};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, locker_code, status, current_user_id, location, occupied_at, \
    created_at, updated_at";

/// Provides CRUD operations for lockers.
pub struct LockerRepo;

impl LockerRepo {
    /// List all lockers with their current occupant (if any), ordered by ID.
    pub async fn list_with_occupants(
        pool: &PgPool,
    ) -> Result<Vec<LockerWithOccupant>, sqlx::Error> {
        sqlx::query_as::<_, LockerWithOccupant>(
            "SELECT l.id, l.locker_code, l.status, l.current_user_id, \
                    u.name AS user_name, u.nim AS user_nim, l.updated_at \
             FROM lockers l \
             LEFT JOIN users u ON l.current_user_id = u.id \
             ORDER BY l.id",
        )
        .fetch_all(pool)
        .await
    }

    /// Find a locker by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Locker>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lockers WHERE id = $1");
        sqlx::query_as::<_, Locker>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new locker, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateLocker) -> Result<Locker, sqlx::Error> {
        let query = format!(
            "INSERT INTO lockers (locker_code, location) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Locker>(&query)
            .bind(&input.locker_code)
            .bind(&input.location)
            .fetch_one(pool)
            .await
    }

    /// Set a locker's status directly (admin maintenance flow).
    ///
    /// Moving to `available` or `maintenance` clears the occupant reference.
    /// Returns `None` if the locker does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Locker>, sqlx::Error> {
        let query = format!(
            "UPDATE lockers SET \
                 status = $2, \
                 current_user_id = CASE WHEN $2 = 'occupied' THEN current_user_id ELSE NULL END, \
                 occupied_at = CASE WHEN $2 = 'occupied' THEN occupied_at ELSE NULL END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Locker>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
