pub mod notification;
pub mod renewables;
pub mod root;
pub mod status;

use axum::Router;

use crate::state::AppState;

/// Build the `/energy/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /renewables/current/{country?}       current share per country
/// /renewables/history/{country?}       historical share per country
///
/// /notification                        list, register
/// /notification/{id}                   get, delete
///
/// /status                              dependency diagnostics
/// ```
///
/// Trailing slashes are accepted everywhere. Extra path segments are
/// rejected with 400, unsupported methods with 501.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/renewables", renewables::router())
        .merge(notification::router())
        .merge(status::router())
}
