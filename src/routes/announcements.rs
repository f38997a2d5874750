use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    middleware::{admin::AdminAuth, client::ClientId},
    models::announcement::{dedupe_announcements, Announcement},
    AppState,
};

/// GET /announcement — the announcement this client should see, or null.
pub async fn get_announcement(
    State(state): State<AppState>,
    ClientId(client): ClientId,
) -> Json<Value> {
    Json(json!(state.sessions.current(&client).await))
}

/// POST /announcement/dismiss — dismiss the displayed announcement, returns the next one or null.
pub async fn dismiss_announcement(
    State(state): State<AppState>,
    ClientId(client): ClientId,
) -> Json<Value> {
    Json(json!(state.sessions.dismiss(&client).await))
}

/// GET /admin/announcements — the configured list, in priority order.
pub async fn list_announcements(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Json<Value> {
    Json(json!(state.sessions.announcements()))
}

/// PUT /admin/announcements — replace the configured list. An empty list clears the banner.
pub async fn set_announcements(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(body): Json<Vec<Announcement>>,
) -> Json<Value> {
    let announcements = dedupe_announcements(body);
    let configured = announcements.len();
    let sessions = state.sessions.set_announcements(Some(announcements));

    Json(json!({ "announcements": configured, "sessions": sessions }))
}
