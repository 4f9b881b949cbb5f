//! Query parameter parsing shared by the data handlers.
//!
//! Parameters arrive as a raw `HashMap<String, String>` so malformed values
//! can be rejected with the service's own messages instead of the generic
//! extractor rejection.

use std::collections::HashMap;

use renewables_core::error::CoreError;
use renewables_core::renewables::YearRange;
use renewables_core::types::Year;

use crate::error::{AppError, AppResult};

pub type QueryParams = HashMap<String, String>;

/// Boolean flag: `true`/`1` or `false`/`0`, absent or empty means `false`.
pub fn bool_param(params: &QueryParams, name: &str) -> AppResult<bool> {
    match params.get(name).map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(_) => Err(malformed(name)),
    }
}

/// Optional integer year.
pub fn year_param(params: &QueryParams, name: &str) -> AppResult<Option<Year>> {
    match params.get(name).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| malformed(name)),
    }
}

/// Year range from the `begin` and `end` parameters.
pub fn year_range(params: &QueryParams) -> AppResult<YearRange> {
    let begin = year_param(params, "begin")?;
    let end = year_param(params, "end")?;
    YearRange::from_bounds(begin, end).map_err(|e| match e {
        CoreError::Validation(msg) => AppError::BadRequest(format!("Malformed URL, {msg}")),
        other => other.into(),
    })
}

fn malformed(name: &str) -> AppError {
    AppError::BadRequest(format!("Malformed URL, invalid {name} parameter set"))
}
