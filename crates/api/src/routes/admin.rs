//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET  /overtime             -> list_overtime
/// POST /takeover             -> takeover
/// POST /lockers              -> create_locker
/// PUT  /lockers/{id}/status  -> set_locker_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overtime", get(admin::list_overtime))
        .route("/takeover", post(admin::takeover))
        .route("/lockers", post(admin::create_locker))
        .route("/lockers/{id}/status", put(admin::set_locker_status))
}
