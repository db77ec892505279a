// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every failure carries a single human-readable message; the variant decides
/// the HTTP status code when it reaches the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // 502 Bad Gateway: transport failure talking to the trivia API
    Network(String),

    // 502 Bad Gateway: the trivia API answered with a malformed body
    Decode(String),

    // 401 Unauthorized
    AuthError(String),

    // 503 Service Unavailable: aggregate store read/write/transaction failure
    Store(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate e-mail, operation invalid in the quiz's current phase)
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    /// The bare message, without the variant name.
    pub fn message(&self) -> &str {
        match self {
            AppError::Network(msg)
            | AppError::Decode(msg)
            | AppError::AuthError(msg)
            | AppError::Store(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "network error: {}", msg),
            AppError::Decode(msg) => write!(f, "decode error: {}", msg),
            AppError::AuthError(msg) => write!(f, "authentication failed: {}", msg),
            AppError::Store(msg) => write!(f, "stats store error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Network(msg) | AppError::Decode(msg) => {
                tracing::warn!("Trivia API failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Store(msg) => {
                tracing::error!("Stats store failure: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Database failures all surface as store errors.
/// Allows using `?` operator on queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

/// Splits reqwest failures into transport problems and unreadable bodies.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}
