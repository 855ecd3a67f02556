// POST /api/v1/collect: SDK ingestion, 204 on success.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::AppState;
use super::error::ApiError;
use crate::models::CollectPayload;

pub(super) async fn collect_handler(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Ok(Json(value)) = body else {
        return Err(ApiError::InvalidPayload);
    };
    let payload = CollectPayload::parse(&value).ok_or(ApiError::InvalidPayload)?;
    state.service.collect(&payload).await.map_err(|e| {
        tracing::warn!(error = %e, operation = "collect", "failed to persist payload");
        ApiError::CollectFailed {
            detail: e.to_string(),
        }
    })?;
    Ok(StatusCode::NO_CONTENT)
}
