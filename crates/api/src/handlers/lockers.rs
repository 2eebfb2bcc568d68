//! Handlers for the `/lockers` resource.
//!
//! Listing, checkout, release, the on-demand duration/warning query, and a
//! user's usage history.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use lokr_core::duration::{assess, WarningLevel};
use lokr_core::error::CoreError;
use lokr_core::types::{DbId, Timestamp};
use lokr_db::models::locker::{Locker, LockerWithOccupant};
use lokr_db::models::usage::{LockerUsage, UsageHistoryEntry};
use lokr_db::repositories::{LockerRepo, UsageRepo};
use lokr_events::LockerEvent;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default and maximum page size for the history endpoint.
const HISTORY_DEFAULT_LIMIT: i64 = 50;
const HISTORY_MAX_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/lockers
///
/// All lockers with status and current occupant.
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<LockerWithOccupant>>>> {
    let lockers = LockerRepo::list_with_occupants(&state.pool).await?;
    Ok(Json(DataResponse { data: lockers }))
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// Request body for the checkout endpoint.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: DbId,
    /// Specific locker to claim; omitted means "first available".
    pub locker_id: Option<DbId>,
}

/// Response payload after a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub locker: Locker,
    pub usage: LockerUsage,
}

/// POST /api/v1/lockers/checkout
///
/// Claim a locker for a user and open a usage session.
pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Json<DataResponse<CheckoutResponse>>> {
    let claimed = UsageRepo::checkout(&state.pool, body.user_id, body.locker_id).await?;

    let Some((locker, usage)) = claimed else {
        // Distinguish "no such locker" from "lost the race / not available".
        if let Some(locker_id) = body.locker_id {
            if LockerRepo::find_by_id(&state.pool, locker_id).await?.is_none() {
                return Err(AppError::Core(CoreError::NotFound {
                    entity: "locker",
                    id: locker_id,
                }));
            }
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Locker {locker_id} is not available"
            ))));
        }
        return Err(AppError::Core(CoreError::Conflict(
            "No locker is currently available".to_string(),
        )));
    };

    state.event_bus.publish(
        LockerEvent::new("locker.updated")
            .with_locker(locker.id)
            .with_user(body.user_id)
            .with_payload(serde_json::json!({
                "locker_id": locker.id,
                "locker_code": locker.locker_code,
                "status": locker.status,
                "user_id": body.user_id,
                "action": "checkout",
            })),
    );

    tracing::info!(
        locker_id = locker.id,
        user_id = body.user_id,
        "Locker checked out"
    );

    Ok(Json(DataResponse {
        data: CheckoutResponse { locker, usage },
    }))
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// Request body for the release endpoint.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub user_id: DbId,
    pub locker_id: DbId,
}

/// POST /api/v1/lockers/release
///
/// End the caller's active session on a locker and free it.
pub async fn release(
    State(state): State<AppState>,
    Json(body): Json<ReleaseRequest>,
) -> AppResult<Json<DataResponse<LockerUsage>>> {
    let usage = UsageRepo::release(&state.pool, body.user_id, body.locker_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "active locker session",
            id: body.locker_id,
        })?;

    state.event_bus.publish(
        LockerEvent::new("locker.updated")
            .with_locker(body.locker_id)
            .with_user(body.user_id)
            .with_payload(serde_json::json!({
                "locker_id": body.locker_id,
                "status": "available",
                "user_id": serde_json::Value::Null,
                "action": "release",
            })),
    );

    tracing::info!(
        locker_id = body.locker_id,
        user_id = body.user_id,
        duration_minutes = usage.duration_minutes,
        "Locker released"
    );

    Ok(Json(DataResponse { data: usage }))
}

// ---------------------------------------------------------------------------
// Duration query
// ---------------------------------------------------------------------------

/// Query parameters for the duration check.
#[derive(Debug, Deserialize)]
pub struct DurationQuery {
    pub user_id: DbId,
}

/// Warning state of a user's active session, if any.
#[derive(Debug, Serialize)]
pub struct DurationStatus {
    pub has_active_locker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locker_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locker_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_level: Option<WarningLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<i64>,
}

/// GET /api/v1/lockers/check-duration?user_id=
///
/// The on-demand warning assessment for a user's active session. Pure
/// projection -- never mutates flags; only the sweep sends notifications.
pub async fn check_duration(
    State(state): State<AppState>,
    Query(query): Query<DurationQuery>,
) -> AppResult<Json<DataResponse<DurationStatus>>> {
    let Some(active) = UsageRepo::find_active_for_user(&state.pool, query.user_id).await? else {
        return Ok(Json(DataResponse {
            data: DurationStatus {
                has_active_locker: false,
                locker_id: None,
                locker_code: None,
                start_time: None,
                duration_minutes: None,
                duration_hours: None,
                warning_level: None,
                warning_message: None,
                remaining_minutes: None,
            },
        }));
    };

    let assessment = assess(active.start_time, chrono::Utc::now());

    Ok(Json(DataResponse {
        data: DurationStatus {
            has_active_locker: true,
            locker_id: Some(active.locker_id),
            locker_code: Some(active.locker_code),
            start_time: Some(active.start_time),
            duration_minutes: Some(assessment.duration_minutes),
            duration_hours: Some(assessment.duration_minutes / 60),
            warning_level: Some(assessment.level),
            warning_message: Some(assessment.message),
            remaining_minutes: Some(assessment.remaining_minutes),
        },
    }))
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: DbId,
    pub limit: Option<i64>,
}

/// GET /api/v1/lockers/history?user_id=
///
/// A user's closed sessions, most recent first.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<UsageHistoryEntry>>>> {
    let limit = query
        .limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_MAX_LIMIT);
    let entries = UsageRepo::list_history_for_user(&state.pool, query.user_id, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}
