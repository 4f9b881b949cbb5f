use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use renewables_core::error::CoreError;
use renewables_countries::CountryError;
use renewables_db::store::StoreError;
use renewables_db::DbError;

/// User message for requests that fail on an unknown country.
pub const UNKNOWN_COUNTRY: &str = "No country with given ISO code or name exists in our service";

/// User message for data queries that produce no rows.
pub const NO_DATA: &str = "No data available for given request";

const INTERNAL: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps the library errors and adds HTTP-specific variants. Implements
/// [`IntoResponse`] as the single place where errors become responses: the
/// full error is logged, only the user message goes on the wire as
/// `text/plain`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `renewables_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A document store or health gate error.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A country directory error.
    #[error(transparent)]
    Country(#[from] CountryError),

    /// Malformed URL, parameter or body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The endpoint exists but does not support the HTTP method used.
    #[error("Method not implemented: {0}")]
    MethodNotImplemented(&'static str),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status code and user-facing message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => {
                    (StatusCode::NOT_FOUND, format!("{entity} {id} not found"))
                }
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into()),
            },

            AppError::Db(db) => match db {
                DbError::Degraded { retry_in_secs } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!(
                        "The database is currently unavailable. Please try again later. \
                         Reattempting database connection in {retry_in_secs} seconds."
                    ),
                ),
                DbError::Store(StoreError::NotFound { .. }) => {
                    (StatusCode::NOT_FOUND, "Resource not found".into())
                }
                DbError::Store(StoreError::Unavailable(_)) => (
                    StatusCode::BAD_GATEWAY,
                    "The database could not be reached".into(),
                ),
                DbError::Store(StoreError::Malformed(_)) | DbError::Decode { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into())
                }
            },

            AppError::Country(country) => match country {
                CountryError::NotFound(_) => (StatusCode::NOT_FOUND, UNKNOWN_COUNTRY.into()),
                CountryError::Request(_) | CountryError::Api { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "The country directory could not be reached".into(),
                ),
                CountryError::InvalidUrl(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into()),
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::MethodNotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, (*msg).into()),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, message).into_response()
    }
}
