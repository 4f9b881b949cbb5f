#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use renewables_api::config::ServerConfig;
use renewables_api::router::build_app_router;
use renewables_api::state::AppState;
use renewables_core::country::Country;
use renewables_core::renewables::RenewablesSeries;
use renewables_core::tasks::BackgroundTasks;
use renewables_countries::{CountryDirectory, StaticDirectory};
use renewables_db::cache::ResponseCache;
use renewables_db::repositories::RenewablesRepo;
use renewables_db::store::MemoryStore;
use renewables_db::Database;
use renewables_events::{EventBus, WebhookDelivery, WebhookInvoker};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        ..ServerConfig::default()
    }
}

/// A fully wired application over an in-memory store.
///
/// The webhook invoker loop runs in the background exactly as in `main.rs`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub tasks: BackgroundTasks,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Norway, Sweden and Finland with data; Russia known to the directory only.
pub fn nordic_directory() -> StaticDirectory {
    let country = |name: &str, iso: &str, borders: &[&str]| Country {
        name: name.into(),
        iso_code: iso.into(),
        borders: borders.iter().map(|b| b.to_string()).collect(),
    };
    StaticDirectory::new([
        country("Norway", "NOR", &["FIN", "SWE", "RUS"]),
        country("Sweden", "SWE", &["FIN", "NOR"]),
        country("Finland", "FIN", &["NOR", "SWE", "RUS"]),
        country("Russia", "RUS", &["FIN", "NOR"]),
    ])
}

pub fn series(iso: &str, name: &str, points: &[(i32, f64)]) -> RenewablesSeries {
    RenewablesSeries {
        iso_code: iso.into(),
        name: name.into(),
        percentages: points.iter().copied().collect(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(nordic_directory())).await
}

pub async fn spawn_app_with(countries: Arc<dyn CountryDirectory>) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let db = Database::new(store.clone(), config.db_reconnect_interval());

    for s in [
        series("NOR", "Norway", &[(2019, 69.0), (2020, 70.0), (2021, 71.5)]),
        series("SWE", "Sweden", &[(2020, 50.0), (2021, 51.0)]),
        series("FIN", "Finland", &[(1990, 20.0), (2021, 45.0)]),
    ] {
        RenewablesRepo::upsert(&db, &s).await.unwrap();
    }

    let tasks = BackgroundTasks::default();
    let cache = ResponseCache::new(db.clone(), tasks.clone(), config.cache_max_age());
    let event_bus = Arc::new(EventBus::default());
    let delivery = Arc::new(WebhookDelivery::new(Duration::from_secs(5)).unwrap());
    let invoker = Arc::new(WebhookInvoker::new(
        db.clone(),
        Arc::clone(&countries),
        delivery,
        tasks.clone(),
    ));
    tokio::spawn(invoker.run(event_bus.subscribe()));

    let state = AppState {
        db,
        cache,
        countries,
        event_bus,
        started_at: Instant::now(),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        store,
        state,
        tasks,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Body::from(json.to_string())).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Background work
// ---------------------------------------------------------------------------

/// Poll `check` until it returns true or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Let spawned tasks run up to their next await point.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
