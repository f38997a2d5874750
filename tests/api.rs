mod common;

use common::{TestServer, ADMIN_KEY};
use serde_json::{json, Value};

#[tokio::test]
async fn health_reports_memory_store() {
    let server = TestServer::start().await;
    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok", "store": "memory" }));
}

#[tokio::test]
async fn missing_or_invalid_client_id_is_rejected() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.url("/announcement")).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing X-Client-Id header");

    let resp = server.client("../../etc").get("/announcement").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn dismiss_walks_the_list_in_order() {
    let server = TestServer::start().await;
    let browser = server.client("browser-1");

    let body: Value = browser.get("/announcement").await.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "id": "a1", "message": "Scheduled maintenance on Sunday", "color": "red" })
    );

    assert_eq!(browser.dismiss().await.as_deref(), Some("a2"));
    assert_eq!(browser.current_id().await.as_deref(), Some("a2"));

    assert_eq!(browser.dismiss().await, None);
    let body: Value = browser.get("/announcement").await.json().await.unwrap();
    assert_eq!(body, Value::Null);

    // Nothing left to dismiss
    let resp = browser.post("/announcement/dismiss").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), Value::Null);

    // Other clients are unaffected
    assert_eq!(server.client("browser-2").current_id().await.as_deref(), Some("a1"));
}

#[tokio::test]
async fn header_combines_brand_and_announcement() {
    let server = TestServer::start().await;
    let body: Value = server.client("browser-1").get("/header").await.json().await.unwrap();

    assert_eq!(body["brand"]["app_name"], "Console");
    assert_eq!(body["brand"]["version"]["text"], "5.11.0-M1");
    assert_eq!(
        body["brand"]["logo"],
        "https://localhost:9443/console/libs/themes/default/assets/images/logo.svg"
    );
    assert_eq!(body["brand_link"], "/develop/getting-started");
    assert_eq!(body["announcement"]["id"], "a1");
}

#[tokio::test]
async fn admin_endpoints_require_key() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    let resp = http
        .put(server.url("/admin/announcements"))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Missing X-Admin-Key header" }));

    let resp = http
        .get(server.url("/admin/announcements"))
        .header("X-Admin-Key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid admin key" }));
}

#[tokio::test]
async fn metrics_report_live_sessions_and_dismissals() {
    let server = TestServer::start().await;
    let browser = server.client("browser-1");
    browser.dismiss().await;
    browser.dismiss().await;

    let resp = reqwest::get(server.url("/metrics")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/plain"));

    let body = resp.text().await.unwrap();
    assert!(body.contains("console_header_sessions"));
    assert!(body.contains(r#"console_announcement_dismissals_total{outcome="advanced"}"#));
    assert!(body.contains(r#"console_announcement_dismissals_total{outcome="exhausted"}"#));
    assert!(!body.contains(r#"outcome="a1""#));
}

#[tokio::test]
async fn replacing_announcements_reselects_live_sessions() {
    let server = TestServer::start().await;
    let browser = server.client("browser-1");
    assert_eq!(browser.dismiss().await.as_deref(), Some("a2"));

    let resp = browser
        .http
        .put(server.url("/admin/announcements"))
        .header("X-Admin-Key", ADMIN_KEY)
        .json(&json!([
            {"id": "a1", "message": "Scheduled maintenance on Sunday", "color": "red"},
            {"id": "a3", "message": "Certificates rotate tonight", "color": "yellow"},
            {"id": "a3", "message": "duplicate", "color": "yellow"}
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "announcements": 2, "sessions": 1 }));

    // a1 stays dismissed
    assert_eq!(browser.current_id().await.as_deref(), Some("a3"));

    let listed: Value = browser
        .http
        .get(server.url("/admin/announcements"))
        .header("X-Admin-Key", ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);

    // Clearing the list hides the banner
    let resp = browser
        .http
        .put(server.url("/admin/announcements"))
        .header("X-Admin-Key", ADMIN_KEY)
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(browser.current_id().await, None);
}

#[tokio::test]
async fn malformed_admin_body_is_rejected() {
    let server = TestServer::start().await;
    let resp = reqwest::Client::new()
        .put(server.url("/admin/announcements"))
        .header("X-Admin-Key", ADMIN_KEY)
        .json(&json!({ "id": "a1" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    assert_eq!(server.client("browser-1").current_id().await.as_deref(), Some("a1"));
}
