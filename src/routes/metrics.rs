use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{Encoder, TextEncoder};

use crate::{services::metrics::SESSIONS_GAUGE, AppState};

/// GET /metrics — dismissal counters and the live session count, in the text format.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    // evictions between requests only show up here
    SESSIONS_GAUGE.set(state.sessions.session_count() as i64);

    let encoder = TextEncoder::new();
    let mut body = String::new();
    encoder
        .encode_utf8(&prometheus::gather(), &mut body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_owned())], body))
}
