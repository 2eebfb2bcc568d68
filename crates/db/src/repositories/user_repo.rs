//! Repository for the `users` table.
//!
//! Read-only: user records are provisioned by the campus account system,
//! this service only looks them up to attribute sessions and address mail.

use sqlx::PgPool;

use lokr_core::types::DbId;

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, nim, email, created_at";

/// Provides lookup operations for user records.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
