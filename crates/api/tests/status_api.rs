//! Integration tests for `/energy/v1/status`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, get, post_json, spawn_app, spawn_app_with};
use httpmock::MockServer;
use renewables_countries::RestCountriesClient;
use serde_json::json;

const STATUS: &str = "/energy/v1/status";

#[tokio::test]
async fn reports_dependencies_and_webhook_count() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("HEAD").path("/");
            then.status(200);
        })
        .await;

    let client = RestCountriesClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let app = spawn_app_with(Arc::new(client)).await;

    let response = post_json(
        app.router(),
        "/energy/v1/notification",
        json!({"url": "http://localhost/hook", "calls": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(app.router(), STATUS).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["countries_api"], "200 OK");
    assert_eq!(json["notification_db"], "200 OK");
    assert_eq!(json["webhooks"], 1);
    assert_eq!(json["version"], "v1");
    assert!(json["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn unreachable_country_api_is_reported() {
    let client = RestCountriesClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let app = spawn_app_with(Arc::new(client)).await;

    let json = body_json(get(app.router(), &format!("{STATUS}/")).await).await;
    assert_eq!(json["countries_api"], "503 Service Unavailable");
    assert_eq!(json["notification_db"], "200 OK");
}

#[tokio::test]
async fn store_failure_is_reported_in_body() {
    let app = spawn_app().await;
    app.store.set_available(false);

    let response = get(app.router(), STATUS).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["notification_db"], "503 Service Unavailable");
    assert_eq!(json["webhooks"], -1);
}
