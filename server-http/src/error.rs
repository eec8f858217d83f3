use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::api::responses::ErrorResponse;

/// Request-level errors, mapped onto HTTP statuses the way the API promises:
/// bad input is the caller's fault, upstream trouble is a 503 and worth
/// retrying, anything else is ours.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("city cannot be empty")]
    EmptyCity,
    #[error(transparent)]
    Core(#[from] shared::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::EmptyCity => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Core(shared::Error::NotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Core(shared::Error::Upstream(reason)) => {
                warn!("upstream failure: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "search service temporarily unavailable, try again later".to_string(),
                )
            }
            ApiError::Core(shared::Error::Cancelled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "search was cancelled, try again later".to_string(),
            ),
            ApiError::Core(e) => {
                warn!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
