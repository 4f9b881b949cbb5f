//! Route definitions for the `/notification` resource.

use axum::routing::{any, get, MethodRouter};
use axum::Router;

use crate::handlers::{self, notification};
use crate::state::AppState;

/// Routes for webhook registration, merged into the API root.
///
/// ```text
/// GET    /notification            -> list
/// POST   /notification            -> register
/// GET    /notification/{id}       -> get_one
/// DELETE /notification/{id}       -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notification", collection())
        .route("/notification/", collection())
        .route("/notification/{id}", member())
        .route("/notification/{id}/", member())
        .route("/notification/{id}/{*rest}", any(notification::malformed))
}

fn collection() -> MethodRouter<AppState> {
    get(notification::list)
        .post(notification::register)
        .delete(notification::delete_without_id)
        .fallback(handlers::notification_methods_only)
}

fn member() -> MethodRouter<AppState> {
    get(notification::get_one)
        .delete(notification::delete)
        .post(notification::malformed)
        .fallback(handlers::notification_methods_only)
}
