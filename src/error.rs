//! HTTP-facing error type. Every handler returns `Result<_, ApiError>`; the
//! response body is always `{"detail": "..."}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::data::DataError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unavailable(String),

    /// Body or query string the extractor could not accept (400, 415 or 422).
    #[error("{message}")]
    InvalidInput { status: StatusCode, message: String },

    /// Upstream service failure. The message is logged, never sent.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidInput { status, .. } => *status,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Upstream(_) => "Upstream service error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CapacityExceeded { .. } => ApiError::Unavailable(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        match e {
            DataError::Validation(msg) => ApiError::BadRequest(msg),
            DataError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential | AuthError::InvalidCredential => {
                ApiError::Unauthorized(e.to_string())
            }
            AuthError::NotConfigured => ApiError::Unavailable(e.to_string()),
            AuthError::Rejected { message, .. } => ApiError::BadRequest(message),
            AuthError::Provider(msg) => ApiError::Upstream(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream(msg) => tracing::error!(error = %msg, "upstream failure"),
            ApiError::Unavailable(msg) => tracing::warn!(error = %msg, "service unavailable"),
            _ => tracing::debug!(status = status.as_u16(), error = %self, "request rejected"),
        }

        let mut response = (status, Json(json!({ "detail": self.detail() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
