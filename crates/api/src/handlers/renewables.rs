//! Handlers for `/renewables/current` and `/renewables/history`.
//!
//! Both endpoints follow the same pipeline: serve from the response cache
//! when possible, otherwise resolve the country scope, aggregate the stored
//! series and cache the serialized body in the background. Every served
//! query is published on the event bus so the webhook invoker can count it.

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use renewables_core::constants::SERVICE_PATH;
use renewables_core::country::CountryOutput;
use renewables_core::renewables::{aggregate, Aggregation, RenewablesSeries, YearRange};
use renewables_core::types::IsoCode;
use renewables_db::repositories::RenewablesRepo;
use renewables_events::QueryEvent;

use crate::error::{AppError, AppResult, NO_DATA, UNKNOWN_COUNTRY};
use crate::query::{bool_param, year_range, QueryParams};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Current
// ---------------------------------------------------------------------------

/// GET /energy/v1/renewables/current
pub async fn current_all(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<QueryParams>,
) -> AppResult<Response> {
    current(&state, None, &uri, &params).await
}

/// GET /energy/v1/renewables/current/{country}
pub async fn current_country(
    State(state): State<AppState>,
    Path(country): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<QueryParams>,
) -> AppResult<Response> {
    current(&state, Some(&country), &uri, &params).await
}

async fn current(
    state: &AppState,
    country: Option<&str>,
    uri: &Uri,
    params: &QueryParams,
) -> AppResult<Response> {
    if let Some(hit) = serve_cached(state, uri).await? {
        return Ok(hit);
    }

    let neighbours = bool_param(params, "neighbours")?;
    let sort_by_value = bool_param(params, "sortByValue")?;
    let scope = resolve_scope(state, country, neighbours).await?;
    let range = YearRange::current();

    let series = load_series(state, &scope).await?;
    let rows = aggregate(&series, &range, Aggregation::Yearly, sort_by_value);
    respond(state, uri, scope, range, &rows)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// GET /energy/v1/renewables/history
pub async fn history_all(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<QueryParams>,
) -> AppResult<Response> {
    history(&state, None, &uri, &params).await
}

/// GET /energy/v1/renewables/history/{country}
pub async fn history_country(
    State(state): State<AppState>,
    Path(country): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<QueryParams>,
) -> AppResult<Response> {
    history(&state, Some(&country), &uri, &params).await
}

async fn history(
    state: &AppState,
    country: Option<&str>,
    uri: &Uri,
    params: &QueryParams,
) -> AppResult<Response> {
    if let Some(hit) = serve_cached(state, uri).await? {
        return Ok(hit);
    }

    let neighbours = bool_param(params, "neighbours")?;
    let sort_by_value = bool_param(params, "sortByValue")?;
    let mean = bool_param(params, "mean")?;
    let range = year_range(params)?;
    let scope = resolve_scope(state, country, neighbours).await?;

    // Without a country the history is always one mean row per country.
    let aggregation = if mean || scope.is_empty() {
        Aggregation::Mean
    } else {
        Aggregation::Yearly
    };

    let series = load_series(state, &scope).await?;
    let rows = aggregate(&series, &range, aggregation, sort_by_value);
    respond(state, uri, scope, range, &rows)
}

/// GET /energy/v1/renewables/current/{country}/...
pub async fn current_malformed() -> AppError {
    AppError::BadRequest(format!(
        "Malformed URL, Expecting format {SERVICE_PATH}/renewables/current/{{country?}}"
    ))
}

/// GET /energy/v1/renewables/history/{country}/...
pub async fn history_malformed() -> AppError {
    AppError::BadRequest(format!(
        "Malformed URL, Expecting format {SERVICE_PATH}/renewables/history/{{country?}}"
    ))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn json_response(body: String) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

/// Replay a cached response and count the query against the webhooks.
async fn serve_cached(state: &AppState, uri: &Uri) -> AppResult<Option<Response>> {
    let Some(hit) = state.cache.lookup(uri.path(), uri.query()).await? else {
        return Ok(None);
    };

    tracing::debug!(path = %uri.path(), "Serving cached response");
    state
        .event_bus
        .publish(QueryEvent::new(hit.iso_codes, hit.range));
    Ok(Some(json_response(hit.body)))
}

/// Countries a request covers. Empty means every country.
///
/// A three-letter segment is taken as an ISO code, anything else as a
/// country name. With `neighbours` the bordering countries are added.
/// Countries without data are dropped; if none remain the request fails
/// with 404.
async fn resolve_scope(
    state: &AppState,
    country: Option<&str>,
    neighbours: bool,
) -> AppResult<Vec<IsoCode>> {
    let Some(segment) = country.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    let iso_code = if segment.chars().count() == 3 {
        segment.to_uppercase()
    } else {
        state.countries.by_name(segment).await?.iso_code
    };

    let mut candidates = vec![iso_code.clone()];
    if neighbours {
        candidates.extend(state.countries.neighbours(&iso_code).await?);
    }

    let mut scope: Vec<IsoCode> = Vec::with_capacity(candidates.len());
    for code in candidates {
        if !scope.contains(&code) && RenewablesRepo::exists(&state.db, &code).await? {
            scope.push(code);
        }
    }

    if scope.is_empty() {
        return Err(AppError::NotFound(UNKNOWN_COUNTRY.into()));
    }
    Ok(scope)
}

async fn load_series(state: &AppState, scope: &[IsoCode]) -> AppResult<Vec<RenewablesSeries>> {
    if scope.is_empty() {
        return Ok(RenewablesRepo::list(&state.db).await?);
    }

    let mut series = Vec::with_capacity(scope.len());
    for code in scope {
        if let Some(s) = RenewablesRepo::find(&state.db, code).await? {
            series.push(s);
        }
    }
    Ok(series)
}

/// Publish the query, then serialize the rows, answer and cache the body.
fn respond(
    state: &AppState,
    uri: &Uri,
    scope: Vec<IsoCode>,
    range: YearRange,
    rows: &[CountryOutput],
) -> AppResult<Response> {
    state
        .event_bus
        .publish(QueryEvent::new(scope.clone(), range));

    if rows.is_empty() {
        return Err(AppError::NotFound(NO_DATA.into()));
    }

    let body = serde_json::to_string(rows)
        .map_err(|e| AppError::InternalError(format!("Failed to encode response: {e}")))?;

    state.cache.store_detached(
        uri.path().to_string(),
        uri.query().map(str::to_string),
        body.clone(),
        scope,
        range,
    );
    Ok(json_response(body))
}
