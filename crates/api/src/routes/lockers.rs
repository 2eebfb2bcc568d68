//! Route definitions for the `/lockers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::lockers;
use crate::state::AppState;

/// Routes mounted at `/lockers`.
///
/// ```text
/// GET  /                -> list
/// POST /checkout        -> checkout
/// POST /release         -> release
/// GET  /check-duration  -> check_duration
/// GET  /history         -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(lockers::list))
        .route("/checkout", post(lockers::checkout))
        .route("/release", post(lockers::release))
        .route("/check-duration", get(lockers::check_duration))
        .route("/history", get(lockers::history))
}
