use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use renewables_api::config::{LogFormat, ServerConfig};
use renewables_api::router::build_app_router;
use renewables_api::state::AppState;
use renewables_core::tasks::BackgroundTasks;
use renewables_countries::{CountryDirectory, RestCountriesClient};
use renewables_db::cache::ResponseCache;
use renewables_db::store::{DocumentStore, MemoryStore, PgDocumentStore};
use renewables_db::Database;
use renewables_events::{EventBus, WebhookDelivery, WebhookInvoker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "renewables_api=debug,tower_http=debug".into());
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Document store ---
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let store = PgDocumentStore::connect(url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("PostgreSQL document store connected, migrations applied");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };
    let db = Database::new(store, config.db_reconnect_interval());

    // --- Background work ---
    let tasks = BackgroundTasks::new(config.background_task_limit);
    let cache = ResponseCache::new(db.clone(), tasks.clone(), config.cache_max_age());

    // --- Country directory ---
    let countries: Arc<dyn CountryDirectory> = Arc::new(
        RestCountriesClient::new(&config.countries_api_url, config.outbound_timeout())
            .expect("Failed to build country API client"),
    );

    // --- Event bus and webhook invoker ---
    let event_bus = Arc::new(EventBus::default());
    let delivery = Arc::new(
        WebhookDelivery::new(config.outbound_timeout()).expect("Failed to build webhook client"),
    );
    let invoker = Arc::new(WebhookInvoker::new(
        db.clone(),
        Arc::clone(&countries),
        delivery,
        tasks.clone(),
    ));
    let invoker_handle = tokio::spawn(invoker.run(event_bus.subscribe()));
    tracing::info!("Webhook invoker started");

    // --- App state ---
    let state = AppState {
        db,
        cache,
        countries,
        event_bus: Arc::clone(&event_bus),
        started_at: Instant::now(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender to close the broadcast channel.
    // This signals the webhook invoker to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), invoker_handle).await;
    tracing::info!("Webhook invoker stopped");

    let pending = tasks.pending();
    if tasks.shutdown(config.shutdown_timeout()).await {
        tracing::info!(pending, "Background tasks drained");
    } else {
        tracing::warn!(
            remaining = tasks.pending(),
            "Background tasks still running at shutdown"
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
