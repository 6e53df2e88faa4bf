//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use item_service::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or invalid request.
    BadRequest(String),
    /// Missing or rejected bearer credential.
    Unauthorized(String),
    /// Resource not found.
    NotFound(String),
    /// Item service failure.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => {
                tracing::warn!(reason = %msg, "request rejected");
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Not-found keeps its own status; store and identity provider failures
/// collapse into a 500 with the detail left in the logs.
fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, err.to_string());
    }

    tracing::error!(error = %err, "item service failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
