// GET handlers: health, version, and the JSON 404 fallback

use axum::{http::StatusCode, response::IntoResponse};

/// Package name and version (from Cargo.toml at build time).
const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /health: liveness probe.
pub(super) async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "ok": true }))
}

/// GET /version: service name and version.
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub(super) async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "code": "NOT_FOUND",
            "message": "route not found",
        })),
    )
}
