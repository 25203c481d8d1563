//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::{header, HeaderValue, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use serde_json::json;
use thiserror::Error;

use antiscam_core::ScanError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Auth errors
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token invalid")]
    TokenInvalid,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),

    // Resource errors
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),

    // Validation errors
    #[error("validation: {0}")]
    ValidationError(String),

    // Quotas
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        remaining: Option<u32>,
        reset_at: Option<DateTime<Utc>>,
        retry_after_secs: Option<u64>,
    },

    // Database errors
    #[error("database: {0}")]
    DatabaseError(String),

    // External service errors
    #[error("external service: {0}")]
    ExternalServiceError(String),

    // Generic errors
    #[error("internal: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    /// 429 for a spent fixed window; retry once it rolls over
    pub fn window_exhausted(message: impl Into<String>, reset_in: Duration) -> Self {
        AppError::RateLimited {
            message: message.into(),
            remaining: Some(0),
            reset_at: None,
            retry_after_secs: Some(reset_in.as_secs().max(1)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Email hoặc mật khẩu không đúng"),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::RateLimited { message, remaining, reset_at, retry_after_secs } => {
                return rate_limited_response(message, *remaining, *reset_at, *retry_after_secs);
            }
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, "External service error")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Lỗi hệ thống. Vui lòng thử lại.")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// 429 body carries the quota state so clients can show a countdown
fn rate_limited_response(
    message: &str,
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
    retry_after_secs: Option<u64>,
) -> Response {
    let status = StatusCode::TOO_MANY_REQUESTS;
    let body = Json(json!({
        "error": message,
        "status": status.as_u16(),
        "remaining": remaining.unwrap_or(0),
        "reset_at": reset_at,
    }));

    let mut response = (status, body).into_response();
    if let Some(secs) = retry_after_secs {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::TokenInvalid
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        // First message wins, like a form library would show it
        let message = err
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Dữ liệu không hợp lệ".to_string());
        AppError::ValidationError(message)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidUrl(msg) => AppError::ValidationError(msg),
            ScanError::RateLimited { retry_after } => AppError::RateLimited {
                message: "Quá nhiều yêu cầu. Vui lòng thử lại sau.".to_string(),
                remaining: Some(0),
                reset_at: None,
                retry_after_secs: Some(retry_after),
            },
            ScanError::Network(msg) => AppError::ExternalServiceError(msg),
            ScanError::Http { service, status } => {
                AppError::ExternalServiceError(format!("{} returned {}", service, status))
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}
