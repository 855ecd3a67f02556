// Error envelope for HTTP responses: `{ code, message }` with a matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::QueryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    #[error("payload does not match monitor-sdk schema")]
    InvalidPayload,
    #[error("failed to persist collect payload")]
    CollectFailed { detail: String },
    #[error("{message}")]
    Internal { code: &'static str, message: String },
}

impl ApiError {
    /// Maps a service failure to a 500 with an endpoint-specific code.
    pub fn internal(code: &'static str) -> impl Fn(anyhow::Error) -> ApiError {
        move |e| {
            tracing::warn!(error = %e, code, "dashboard request failed");
            ApiError::Internal {
                code,
                message: e.to_string(),
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidQuery(_) => "INVALID_QUERY",
            ApiError::InvalidPayload => "INVALID_PAYLOAD",
            ApiError::CollectFailed { .. } => "COLLECT_FAILED",
            ApiError::Internal { code, .. } => code,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery(_) | ApiError::InvalidPayload => StatusCode::BAD_REQUEST,
            ApiError::CollectFailed { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let ApiError::CollectFailed { detail } = &self {
            body["detail"] = serde_json::Value::String(detail.clone());
        }
        (self.status(), Json(body)).into_response()
    }
}
