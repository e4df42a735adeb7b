use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const REDACTED_DETAIL: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Internal Server Error: {message}: {detail}")]
    Internal { message: String, detail: String },

    #[error("Database error: {message}: {detail}")]
    Database { message: String, detail: String },

    #[error("Service unavailable: {message}: {detail}")]
    ServiceUnavailable { message: String, detail: String },
}

/// Unredacted failure detail attached to 5xx responses as an extension.
/// A middleware decides whether it reaches the client.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

impl AppError {
    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        AppError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn database(message: impl Into<String>, detail: impl ToString) -> Self {
        AppError::Database {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            // Slot and cancellation conflicts are reported as plain bad requests.
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::NotFound(message)
            | AppError::BadRequest(message)
            | AppError::ValidationError(message)
            | AppError::Conflict(message)
            | AppError::RateLimited(message) => {
                tracing::warn!("Request rejected: {}: {}", status, message);

                let body = Json(json!({
                    "success": false,
                    "message": message
                }));

                (status, body).into_response()
            }
            AppError::Internal { message, detail }
            | AppError::Database { message, detail }
            | AppError::ServiceUnavailable { message, detail } => {
                tracing::error!("Error: {}: {}: {}", status, message, detail);

                let body = Json(json!({
                    "success": false,
                    "message": message,
                    "error": REDACTED_DETAIL
                }));

                let mut response = (status, body).into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail { message, detail });
                response
            }
        }
    }
}
