use axum::routing::get;
use axum::Router;

use crate::handlers::{self, root};
use crate::state::AppState;

/// Service description at `/`, outside the `/energy/v1` tree.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root::index).fallback(handlers::get_only))
}
