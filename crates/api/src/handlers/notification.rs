//! Handlers for the `/notification` resource (webhook registry).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use renewables_core::constants::SERVICE_PATH;
use renewables_core::webhook::{CreateWebhook, Webhook, ANY_COUNTRY};
use renewables_db::repositories::{RenewablesRepo, WebhookRepo};
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const INVALID_BODY: &str = "Invalid request body for registration of webhook";
const INVALID_COUNTRY: &str = "Invalid country code for registration of webhook";
const INVALID_ID: &str = "Invalid webhookID given";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response body for a successful registration.
#[derive(Debug, Serialize)]
pub struct Registered {
    pub webhook_id: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /energy/v1/notification
///
/// Register a webhook. The country filter must be `ANY` (or absent) or an
/// ISO code with data in the service.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CreateWebhook>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Registered>)> {
    let Json(input) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected webhook registration body");
        AppError::BadRequest(INVALID_BODY.into())
    })?;
    input.validate().map_err(|e| {
        tracing::debug!(error = %e, "Webhook registration failed validation");
        AppError::BadRequest(INVALID_BODY.into())
    })?;

    let country = input.country_filter();
    if country != ANY_COUNTRY && !RenewablesRepo::exists(&state.db, &country).await? {
        return Err(AppError::BadRequest(INVALID_COUNTRY.into()));
    }

    let webhook = WebhookRepo::create(
        &state.db,
        input.url.trim(),
        &country,
        input.calls,
        input.year_filter(),
    )
    .await?;

    tracing::info!(
        webhook_id = %webhook.webhook_id,
        country = %webhook.country,
        calls = webhook.calls,
        "Webhook registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            webhook_id: webhook.webhook_id,
        }),
    ))
}

/// GET /energy/v1/notification
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Webhook>>> {
    Ok(Json(WebhookRepo::list(&state.db).await?))
}

/// GET /energy/v1/notification/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(webhook_id): Path<String>,
) -> AppResult<Json<Webhook>> {
    WebhookRepo::find_by_id(&state.db, &webhook_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(INVALID_ID.into()))
}

/// DELETE /energy/v1/notification/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(webhook_id): Path<String>,
) -> AppResult<StatusCode> {
    if !WebhookRepo::delete(&state.db, &webhook_id).await? {
        return Err(AppError::NotFound(INVALID_ID.into()));
    }

    tracing::info!(webhook_id = %webhook_id, "Webhook deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /energy/v1/notification
pub async fn delete_without_id() -> AppError {
    AppError::BadRequest(format!(
        "Malformed URL, Expecting format {SERVICE_PATH}/notification/{{webhookID}}"
    ))
}

/// Any method on /energy/v1/notification/{id}/...
pub async fn malformed() -> AppError {
    AppError::BadRequest(format!(
        "Malformed URL, Expecting format {SERVICE_PATH}/notification/{{webhookID?}}"
    ))
}
