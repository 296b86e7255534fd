use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No database pool; the API started in degraded mode.
    #[error("database unavailable")]
    Unavailable,
    /// Malformed path or query input.
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Every failure answers 500 with `{"error": message}`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unavailable => tracing::warn!("request rejected: database unavailable"),
            ApiError::InvalidRequest(message) => tracing::warn!(%message, "invalid request"),
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(error = ?err, "request failed");
            }
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}
