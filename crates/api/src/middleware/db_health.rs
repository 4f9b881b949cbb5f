//! Database health gate for the service routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppResult;
use crate::state::AppState;

/// Short-circuit with 503 while the database is known to be down.
///
/// The response tells the client how many seconds remain until the next
/// reconnect attempt. No store call is made.
pub async fn require_healthy_db(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    state.db.ensure_healthy()?;
    Ok(next.run(request).await)
}
