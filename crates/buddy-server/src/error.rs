use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use buddy_core::BuddyError;
use serde_json::json;
use tracing::error;

/// Error response rendered as `{"success": false, "error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Log `cause` and answer 500 with a fixed public message.
    pub fn internal(message: &str, cause: BuddyError) -> Self {
        error!("{}: {}", message, cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Route not found")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BuddyError> for ApiError {
    fn from(err: BuddyError) -> Self {
        let status = match err {
            BuddyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", err);
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
        });

        (self.status, Json(body)).into_response()
    }
}
