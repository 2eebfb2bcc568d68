//! Database-backed tests for the admin locker-management endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use lokr_api::config::ServerConfig;
use lokr_api::router::build_app_router;
use lokr_api::state::AppState;
use lokr_api::ws::WsManager;

fn test_app(pool: PgPool) -> axum::Router {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 5,
        sweep_interval_secs: 1800,
        ws_heartbeat_secs: 30,
    };
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(lokr_events::EventBus::default()),
        mailer: None,
    };
    build_app_router(state, &config)
}

async fn post_locker(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/lockers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_locker_returns_created_row(pool: PgPool) {
    let (status, json) = post_locker(
        test_app(pool),
        r#"{"locker_code": "C1", "location": "basement"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["locker_code"], "C1");
    assert_eq!(json["data"]["status"], "available");
    assert_eq!(json["data"]["location"], "basement");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_locker_with_duplicate_code_conflicts(pool: PgPool) {
    // "A1" is part of the default locker set.
    let (status, json) = post_locker(test_app(pool), r#"{"locker_code": "A1"}"#).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_locker_with_blank_code_is_rejected(pool: PgPool) {
    let (status, json) = post_locker(test_app(pool), r#"{"locker_code": "   "}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
