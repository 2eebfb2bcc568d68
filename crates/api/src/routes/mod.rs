pub mod admin;
pub mod health;
pub mod lockers;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (live locker + warning feed)
///
/// /lockers                             list lockers with occupants (GET)
/// /lockers/checkout                    claim a locker (POST)
/// /lockers/release                     release a locker (POST)
/// /lockers/check-duration              duration + warning status (GET)
/// /lockers/history                     a user's closed sessions (GET)
///
/// /admin/overtime                      sessions past 24h (GET)
/// /admin/takeover                      force-close a session (POST)
/// /admin/lockers                       register a new locker (POST)
/// /admin/lockers/{id}/status           set locker status (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/lockers", lockers::router())
        .nest("/admin", admin::router())
}
