use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{services::sessions::DismissalBackend, AppState};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = state.sessions.backend();
    let DismissalBackend::Redis { conn, .. } = backend else {
        return (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": backend.name() })),
        );
    };

    let mut conn = conn.clone();
    let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
    match pong {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": "redis" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "store": e.to_string() })),
        ),
    }
}
