//! Request handlers, grouped by resource.

pub mod notification;
pub mod renewables;
pub mod root;
pub mod status;

use crate::error::AppError;

const GET_ONLY: &str = "Invalid method, currently only GET is supported";
const NOTIFICATION_METHODS: &str = "Invalid method, currently only Post, Delete, Get supported";

/// Method fallback for GET-only endpoints.
pub async fn get_only() -> AppError {
    AppError::MethodNotImplemented(GET_ONLY)
}

/// Method fallback for the notification endpoints.
pub async fn notification_methods_only() -> AppError {
    AppError::MethodNotImplemented(NOTIFICATION_METHODS)
}
