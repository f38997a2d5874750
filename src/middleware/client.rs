use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::services::dismissals::is_valid_client_id;

/// Identifies the browser/client whose dismissal record is used, from the `X-Client-Id` header.
#[derive(Debug, Clone)]
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client = parts
            .headers
            .get("X-Client-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing X-Client-Id header" })),
            ))?;

        if !is_valid_client_id(client) {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid client identifier" })),
            ));
        }

        Ok(ClientId(client.to_owned()))
    }
}
