//! Repository for the `locker_usage` table and the session lifecycle.
//!
//! Every state transition here is a conditional write: checkout is guarded
//! by `status = 'available'`, release/takeover by `end_time IS NULL`, and
//! the warning flags by `NOT <flag>`. Callers learn they lost a race from a
//! `None`/`false` return, never from a partially applied update. Operations
//! that touch both `locker_usage` and `lockers` run in a single transaction.

use sqlx::PgPool;

use lokr_core::escalation::EscalationKind;
use lokr_core::types::DbId;

use crate::models::locker::Locker;
use crate::models::usage::{ActiveUsage, LockerUsage, UsageHistoryEntry};

/// Column list for `locker_usage` queries.
const USAGE_COLUMNS: &str = "\
    id, user_id, locker_id, start_time, end_time, duration_minutes, \
    warning_13h_sent, warning_27h_sent, taken_by_admin, admin_takeover_at, \
    notes, created_at";

/// Column list for `lockers` rows returned from lifecycle updates.
const LOCKER_COLUMNS: &str = "\
    id, locker_code, status, current_user_id, location, occupied_at, \
    created_at, updated_at";

/// Joined select used by the sweep and the admin overtime listing.
const ACTIVE_SELECT: &str = "\
    SELECT lu.id, lu.user_id, u.name AS user_name, u.email AS user_email, \
           u.nim AS user_nim, lu.locker_id, l.locker_code, lu.start_time, \
           lu.warning_13h_sent, lu.warning_27h_sent \
    FROM locker_usage lu \
    JOIN users u ON lu.user_id = u.id \
    JOIN lockers l ON lu.locker_id = l.id \
    WHERE lu.end_time IS NULL";

/// SQL expression for the final duration of a session being closed now.
const FINAL_DURATION: &str =
    "GREATEST(0, FLOOR(EXTRACT(EPOCH FROM (now() - start_time)) / 60))::int";

/// Provides session lifecycle and query operations for locker usage.
pub struct UsageRepo;

impl UsageRepo {
    /// Claim a locker for a user and open a session, atomically.
    ///
    /// When `locker_id` is `None` the first available locker (lowest ID) is
    /// claimed. Returns `None` if the requested locker is not available (or
    /// no locker is free) -- a lost race, not an error.
    pub async fn checkout(
        pool: &PgPool,
        user_id: DbId,
        locker_id: Option<DbId>,
    ) -> Result<Option<(Locker, LockerUsage)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locker = match locker_id {
            Some(id) => {
                let claim = format!(
                    "UPDATE lockers SET status = 'occupied', current_user_id = $1, \
                         occupied_at = now(), updated_at = now() \
                     WHERE id = $2 AND status = 'available' \
                     RETURNING {LOCKER_COLUMNS}"
                );
                sqlx::query_as::<_, Locker>(&claim)
                    .bind(user_id)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => {
                // FOR UPDATE SKIP LOCKED keeps concurrent walk-up checkouts
                // from fighting over the same row.
                let claim = format!(
                    "UPDATE lockers SET status = 'occupied', current_user_id = $1, \
                         occupied_at = now(), updated_at = now() \
                     WHERE id = (SELECT id FROM lockers WHERE status = 'available' \
                                 ORDER BY id LIMIT 1 FOR UPDATE SKIP LOCKED) \
                     RETURNING {LOCKER_COLUMNS}"
                );
                sqlx::query_as::<_, Locker>(&claim)
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        let Some(locker) = locker else {
            return Ok(None);
        };

        let insert = format!(
            "INSERT INTO locker_usage (user_id, locker_id) VALUES ($1, $2) \
             RETURNING {USAGE_COLUMNS}"
        );
        let usage = sqlx::query_as::<_, LockerUsage>(&insert)
            .bind(user_id)
            .bind(locker.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((locker, usage)))
    }

    /// End a user's active session on a locker and free the locker.
    ///
    /// Conditional on the session still being active and owned by `user_id`;
    /// returns `None` when there is nothing to release (already ended by a
    /// concurrent release or takeover, or never owned by this user).
    pub async fn release(
        pool: &PgPool,
        user_id: DbId,
        locker_id: DbId,
    ) -> Result<Option<LockerUsage>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let close = format!(
            "UPDATE locker_usage SET end_time = now(), duration_minutes = {FINAL_DURATION} \
             WHERE user_id = $1 AND locker_id = $2 AND end_time IS NULL \
             RETURNING {USAGE_COLUMNS}"
        );
        let usage = sqlx::query_as::<_, LockerUsage>(&close)
            .bind(user_id)
            .bind(locker_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(usage) = usage else {
            return Ok(None);
        };

        Self::free_locker(&mut tx, usage.locker_id).await?;

        tx.commit().await?;
        Ok(Some(usage))
    }

    /// Forcibly end a session on behalf of an admin and free the locker.
    ///
    /// Guarded by `end_time IS NULL`: of a concurrent release and takeover,
    /// exactly one writer wins and the other observes `None`. Both updates
    /// commit as one transaction, so a session can never end up closed with
    /// its locker still marked occupied.
    pub async fn takeover(
        pool: &PgPool,
        usage_id: DbId,
        admin_note: Option<&str>,
    ) -> Result<Option<LockerUsage>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let close = format!(
            "UPDATE locker_usage SET \
                 end_time = now(), \
                 taken_by_admin = TRUE, \
                 admin_takeover_at = now(), \
                 notes = COALESCE($2, notes), \
                 duration_minutes = {FINAL_DURATION} \
             WHERE id = $1 AND end_time IS NULL \
             RETURNING {USAGE_COLUMNS}"
        );
        let usage = sqlx::query_as::<_, LockerUsage>(&close)
            .bind(usage_id)
            .bind(admin_note)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(usage) = usage else {
            return Ok(None);
        };

        Self::free_locker(&mut tx, usage.locker_id).await?;

        tx.commit().await?;
        Ok(Some(usage))
    }

    /// Mark a locker available and clear its occupant, inside a transaction.
    async fn free_locker(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        locker_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE lockers SET status = 'available', current_user_id = NULL, \
                 occupied_at = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(locker_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Atomically set a warning flag, reporting whether this call won.
    ///
    /// `UPDATE … WHERE NOT <flag>` is the primitive that makes escalation
    /// at-most-once under concurrent sweeps: only the caller that flips the
    /// flag gets `true` and may send the notification.
    pub async fn try_mark_warning_sent(
        pool: &PgPool,
        usage_id: DbId,
        kind: EscalationKind,
    ) -> Result<bool, sqlx::Error> {
        let flag = match kind {
            EscalationKind::DurationWarning => "warning_13h_sent",
            EscalationKind::TakeoverWarning => "warning_27h_sent",
        };
        let query = format!(
            "UPDATE locker_usage SET {flag} = TRUE \
             WHERE id = $1 AND {flag} = FALSE AND end_time IS NULL"
        );
        let result = sqlx::query(&query).bind(usage_id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a user's current active session, with occupant and locker details.
    pub async fn find_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ActiveUsage>, sqlx::Error> {
        let query = format!("{ACTIVE_SELECT} AND lu.user_id = $1 ORDER BY lu.start_time DESC LIMIT 1");
        sqlx::query_as::<_, ActiveUsage>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List every active session, oldest first. Input to the sweep.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<ActiveUsage>, sqlx::Error> {
        let query = format!("{ACTIVE_SELECT} ORDER BY lu.start_time ASC");
        sqlx::query_as::<_, ActiveUsage>(&query).fetch_all(pool).await
    }

    /// List active sessions past the 24-hour nominal maximum, oldest first.
    pub async fn list_overtime(pool: &PgPool) -> Result<Vec<ActiveUsage>, sqlx::Error> {
        let query = format!(
            "{ACTIVE_SELECT} AND lu.start_time <= now() - interval '24 hours' \
             ORDER BY lu.start_time ASC"
        );
        sqlx::query_as::<_, ActiveUsage>(&query).fetch_all(pool).await
    }

    /// A user's closed sessions, most recent first.
    pub async fn list_history_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<UsageHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, UsageHistoryEntry>(
            "SELECT lu.id, lu.locker_id, l.locker_code, lu.start_time, lu.end_time, \
                    lu.duration_minutes, lu.taken_by_admin \
             FROM locker_usage lu \
             JOIN lockers l ON lu.locker_id = l.id \
             WHERE lu.user_id = $1 AND lu.end_time IS NOT NULL \
             ORDER BY lu.start_time DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
