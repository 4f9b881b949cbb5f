//! Route definitions for the `/renewables` resource.

use axum::routing::{get, MethodRouter};
use axum::Router;

use crate::handlers::{self, renewables};
use crate::state::AppState;

/// Routes mounted at `/renewables`.
///
/// ```text
/// GET    /current                 -> current_all
/// GET    /current/{country}       -> current_country
/// GET    /history                 -> history_all
/// GET    /history/{country}       -> history_country
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current", get_only(get(renewables::current_all)))
        .route("/current/", get_only(get(renewables::current_all)))
        .route("/current/{country}", get_only(get(renewables::current_country)))
        .route("/current/{country}/", get_only(get(renewables::current_country)))
        .route(
            "/current/{country}/{*rest}",
            get_only(get(renewables::current_malformed)),
        )
        .route("/history", get_only(get(renewables::history_all)))
        .route("/history/", get_only(get(renewables::history_all)))
        .route("/history/{country}", get_only(get(renewables::history_country)))
        .route("/history/{country}/", get_only(get(renewables::history_country)))
        .route(
            "/history/{country}/{*rest}",
            get_only(get(renewables::history_malformed)),
        )
}

fn get_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(handlers::get_only)
}
