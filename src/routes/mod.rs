// HTTP routes: health/version, dashboard queries, SDK collect endpoint.
// Collect and dashboard each carry their own CORS policy.

mod collect;
mod dashboard;
mod error;
mod http;

use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::{AppConfig, CorsPolicy};
use crate::service::DashboardService;

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<DashboardService>,
}

pub fn app(service: Arc<DashboardService>, config: &AppConfig) -> Router {
    let state = AppState { service };

    let collect = Router::new()
        .route("/api/v1/collect", post(collect::collect_handler)) // POST /api/v1/collect
        .layer(cors_layer(&config.cors.collect, "collect"));

    let dashboard = Router::new()
        .route("/api/v1/dashboard/overview", get(dashboard::overview_handler))
        .route("/api/v1/dashboard/charts", get(dashboard::charts_handler))
        .route("/api/v1/dashboard/routes", get(dashboard::routes_handler))
        .route("/api/v1/dashboard/errors", get(dashboard::errors_handler))
        .layer(cors_layer(&config.cors.dashboard, "dashboard"));

    Router::new()
        .route("/health", get(http::health_handler)) // GET /health
        .route("/version", get(http::version_handler)) // GET /version
        .merge(collect)
        .merge(dashboard)
        .fallback(http::not_found_handler)
        .with_state(state)
}

/// Credentialed policies mirror the request's origin, methods and headers
/// instead of answering `*`.
fn cors_layer(policy: &CorsPolicy, scope: &'static str) -> CorsLayer {
    let layer = if policy.allow_credentials {
        CorsLayer::new()
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new().allow_methods(Any).allow_headers(Any)
    };
    if policy.allows_any() {
        return layer.allow_origin(if policy.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        });
    }
    let origins: Vec<HeaderValue> = policy
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(scope, origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
