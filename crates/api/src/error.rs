//! Error types for the LexQA HTTP API server.

use axum::response::IntoResponse;
use thiserror::Error;

use crate::response::ApiResponse;

/// Main error type for API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication/authorization error.
    #[error("{0}")]
    Auth(String),

    /// Duplicate resource, e.g. registering an existing username.
    #[error("{0}")]
    Conflict(String),

    /// Invalid request parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Upstream LLM provider failure that could not be degraded.
    #[error("上游服务错误: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("内部错误: {0}")]
    Internal(String),

    /// Core LexQA error.
    #[error("{0}")]
    Core(#[from] lexqa_core::Error),
}

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Convert to HTTP status code.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Json(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(err) => match err {
                lexqa_core::Error::Conflict(_) => StatusCode::CONFLICT,
                lexqa_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
                lexqa_core::Error::Auth(_) => StatusCode::UNAUTHORIZED,
                lexqa_core::Error::Validation(_) => StatusCode::BAD_REQUEST,
                lexqa_core::Error::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ApiResponse::<()>::error(status.as_u16(), self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
