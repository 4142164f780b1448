//! Error types shared across the service.
//!
//! - `AiError`  : LLM client failures, split by whether a retry can help
//! - `ApiError` : what handlers return; renders `{"detail", "status_code", "type"}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Debug, Clone, Error)]
pub enum AiError {
    /// No API key configured; the client was never built.
    #[error("AI service is not configured")]
    Disabled,

    /// Timeouts, connection failures, HTTP 408/429/5xx.
    #[error("transient AI service failure: {0}")]
    Transient(String),

    /// Authentication failures and other 4xx, or an unusable response body.
    #[error("AI service rejected the request: {0}")]
    Fatal(String),
}

impl AiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AiError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Request passed JSON extraction but failed field validation (422).
    #[error("{0}")]
    Validation(String),

    /// Endpoint has no fallback and the AI client is disabled (503).
    #[error("{0}")]
    AiUnavailable(String),

    /// Endpoint has no fallback and the model call failed (502).
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Disabled => ApiError::AiUnavailable(
                "AI service is not configured; set AZURE_OPENAI_API_KEY or OPENAI_API_KEY".into(),
            ),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AiUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound { .. }) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_error",
            ApiError::AiUnavailable(_) => "ai_unavailable",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "learnpath", status = status.as_u16(), error = %self, "request failed");
        }

        let body = Json(json!({
            "detail": self.to_string(),
            "status_code": status.as_u16(),
            "type": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
