//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with
//! a status chosen by [`ApiError::status`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eventlog_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-range query parameters.
    #[error("{0}")]
    BadRequest(String),

    /// Request body that is not a valid event (syntax, types, unknown fields,
    /// missing content type). Carries the status axum chose for it.
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody { status, .. } => *status,
            Self::Store(StoreError::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short classification string for logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::InvalidBody { .. } => "invalid_body",
            Self::Store(StoreError::Parse(e)) => e.error_kind(),
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Server-side failures are not echoed back.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::warn!(code, error = %self, "request rejected");
        }
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
