use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::foundation::error::WheelError;

/// HTTP-facing error: a [`WheelError`] rendered as `{success:false, error, code}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Domain error, mapped by variant.
    #[error(transparent)]
    Wheel(#[from] WheelError),

    /// Malformed request that never reached the domain layer.
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Handler return type.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Wheel(WheelError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            Self::Wheel(WheelError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Wheel(WheelError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN")
            }
            Self::Wheel(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "internal error");
            "An internal error occurred".to_string()
        } else {
            match &self {
                Self::Wheel(WheelError::Validation(msg) | WheelError::NotFound(msg)) => msg.clone(),
                other => other.to_string(),
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/server/error.rs"]
mod tests;
