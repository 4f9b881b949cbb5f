//! Handler for the `/status` diagnostics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use renewables_core::constants::VERSION;
use renewables_db::repositories::WebhookRepo;
use serde::Serialize;

use crate::state::AppState;

/// Status reported for a dependency that could not be reached.
const UNAVAILABLE: &str = "503 Service Unavailable";

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    /// HTTP status of the country directory, e.g. `"200 OK"`.
    pub countries_api: String,
    /// `"200 OK"` when the document store answers a health check.
    pub notification_db: String,
    /// Number of registered webhooks, `-1` when the store is unavailable.
    pub webhooks: i64,
    pub version: &'static str,
    /// Seconds since the service started.
    pub uptime: f64,
}

/// GET /energy/v1/status
///
/// Never fails: unreachable dependencies are reported in the body.
pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let countries_api = match state.countries.probe().await {
        Ok(code) => code.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Country directory probe failed");
            UNAVAILABLE.to_string()
        }
    };

    let notification_db = match state.db.health_check().await {
        Ok(()) => StatusCode::OK.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Document store health check failed");
            UNAVAILABLE.to_string()
        }
    };

    let webhooks = match WebhookRepo::count(&state.db).await {
        Ok(n) => i64::try_from(n).unwrap_or(i64::MAX),
        Err(_) => -1,
    };

    Json(ServiceStatus {
        countries_api,
        notification_db,
        webhooks,
        version: VERSION,
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}
