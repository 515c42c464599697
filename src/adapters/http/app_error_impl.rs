use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app_error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets collapsed into an opaque client message.
        tracing::error!(error = ?self, "Request failed");

        let (status, message) = match self {
            AppError::InvalidEmail => (StatusCode::BAD_REQUEST, "Invalid email"),
            AppError::UnsupportedMediaType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content-type")
            }
            // UniqueViolation is recovered inside the signup flow; if one
            // escapes this far something else went wrong with the database.
            AppError::Database(_) | AppError::UniqueViolation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
        };

        let body = serde_json::json!({ "ok": false, "error": message });
        (status, Json(body)).into_response()
    }
}
