use axum::{extract::State, Json};

use crate::{middleware::client::ClientId, models::header::HeaderView, AppState};

/// GET /header — brand block plus the client's current announcement.
pub async fn get_header(
    State(state): State<AppState>,
    ClientId(client): ClientId,
) -> Json<HeaderView> {
    let announcement = state.sessions.current(&client).await;
    Json(HeaderView::new(&state.console, &state.config.theme, announcement))
}
