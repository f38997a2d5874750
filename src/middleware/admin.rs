use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

/// Guards the announcement admin routes with the shared `X-Admin-Key`.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = parts.headers.get("X-Admin-Key").and_then(|v| v.to_str().ok()) else {
            return Err(unauthorized("Missing X-Admin-Key header"));
        };

        if key.is_empty() || key != state.config.admin_key {
            warn!("Rejected announcement admin request on {}", parts.uri.path());
            return Err(unauthorized("Invalid admin key"));
        }

        Ok(AdminAuth)
    }
}
