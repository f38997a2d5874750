#![allow(dead_code)]

use std::net::SocketAddr;

use console_header::{
    config::{BackendKind, Config},
    models::{console_config::ConsoleConfig, header::Theme},
    router,
    services::sessions::{DismissalBackend, SessionLimits, SessionRegistry},
    AppState,
};
use tokio::task::JoinHandle;

pub const ADMIN_KEY: &str = "test-admin-key";

pub const CONSOLE_CONFIG: &str = r#"{
    "clientOrigin": "https://localhost:9443",
    "appBase": "console",
    "ui": {
        "appName": "Console",
        "appLogoPath": "/assets/images/logo.svg",
        "announcements": [
            {"id": "a1", "message": "Scheduled maintenance on Sunday", "color": "red"},
            {"id": "a2", "message": "New login flows are available", "color": "blue"}
        ],
        "productVersionConfig": {"allowSnapshot": false, "textCase": "uppercase"}
    },
    "deployment": {"productVersion": "5.11.0-m1", "appHomePath": "/develop/getting-started"}
}"#;

/// The API bound to a random local port with in-memory dismissals.
pub struct TestServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let console = ConsoleConfig::from_json_str(CONSOLE_CONFIG).expect("valid console config");
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            console_config_path: "inline".into(),
            dismissal_backend: BackendKind::Memory,
            dismissal_dir: String::new(),
            redis_url: String::new(),
            admin_key: ADMIN_KEY.into(),
            app_base_url: "http://localhost".into(),
            theme: Theme::default(),
            session_limits: SessionLimits::default(),
            session_sweep_secs: 60,
        };
        let sessions = SessionRegistry::new(DismissalBackend::Memory, console.announcements());
        let app = router(AppState::new(config, console, sessions));

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// A client of the API acting as one browser.
    pub fn client(&self, client_id: &str) -> ApiClient {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: self.base_url.clone(),
            client_id: client_id.to_owned(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct ApiClient {
    pub http: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl ApiClient {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header("X-Client-Id", &self.client_id)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header("X-Client-Id", &self.client_id)
            .send()
            .await
            .expect("request failed")
    }

    /// Id of the announcement currently shown, if any.
    pub async fn current_id(&self) -> Option<String> {
        let body: serde_json::Value = self.get("/announcement").await.json().await.unwrap();
        body["id"].as_str().map(str::to_owned)
    }

    pub async fn dismiss(&self) -> Option<String> {
        let body: serde_json::Value = self.post("/announcement/dismiss").await.json().await.unwrap();
        body["id"].as_str().map(str::to_owned)
    }
}
