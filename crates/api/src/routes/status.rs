use axum::routing::get;
use axum::Router;

use crate::handlers::{self, status};
use crate::state::AppState;

/// Routes for the `/status` diagnostics endpoint.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status::status).fallback(handlers::get_only))
        .route("/status/", get(status::status).fallback(handlers::get_only))
}
