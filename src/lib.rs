pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use models::console_config::ConsoleConfig;
use services::sessions::SessionRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub console: Arc<ConsoleConfig>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        config: Config,
        console: ConsoleConfig,
        sessions: impl Into<Arc<SessionRegistry>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            console: Arc::new(console),
            sessions: sessions.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Allow the console's base domain and its subdomains; localhost is always allowed.
    let base = state.config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        if o == base {
            return true;
        }
        if let Some(idx) = base.find("://") {
            let after_scheme = &base[idx + 3..];
            let domain = after_scheme.split('/').next().unwrap_or(after_scheme);
            let domain_clean = domain.split(':').next().unwrap_or(domain);
            if o.ends_with(&format!(".{domain_clean}")) {
                return true;
            }
        }
        false
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-client-id"),
            header::HeaderName::from_static("x-admin-key"),
        ]))
        .allow_origin(cors_origin);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .route("/header", get(routes::header::get_header))
        .route("/announcement", get(routes::announcements::get_announcement))
        .route("/announcement/dismiss", post(routes::announcements::dismiss_announcement))
        .route(
            "/admin/announcements",
            put(routes::announcements::set_announcements)
                .get(routes::announcements::list_announcements),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
