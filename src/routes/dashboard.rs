// Dashboard query handlers. Query strings are parsed and validated here so the
// engine only ever sees a well-formed `[from, to]` range.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::engine::classify::parse_occurred_at;
use crate::models::{DashboardQuery, MonitorEnv, QueryError, RouteType};

const DEFAULT_RANGE_HOURS: i64 = 24;
const QUERY_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;
const DEFAULT_ROUTES_LIMIT: u32 = 10;
const DEFAULT_ERRORS_LIMIT: u32 = 20;

/// Raw query string. Everything is optional and stringly typed; see `to_query`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DashboardParams {
    from: Option<String>,
    to: Option<String>,
    app_id: Option<String>,
    env: Option<String>,
    limit: Option<String>,
    #[serde(rename = "type")]
    route_type: Option<String>,
}

impl DashboardParams {
    /// `to` defaults to `now`, `from` to 24h before `to`. Unknown `env`
    /// values and empty `appId` are ignored rather than rejected.
    fn to_query(&self, now: DateTime<Utc>) -> Result<DashboardQuery, QueryError> {
        let to = match self.to.as_deref() {
            Some(s) => parse_query_datetime(s).ok_or(QueryError::InvalidDatetime)?,
            None => now,
        };
        let from = match self.from.as_deref() {
            Some(s) => parse_query_datetime(s).ok_or(QueryError::InvalidDatetime)?,
            None => to
                .checked_sub_signed(TimeDelta::hours(DEFAULT_RANGE_HOURS))
                .ok_or(QueryError::InvalidDatetime)?,
        };
        Ok(DashboardQuery::new(from, to)?
            .with_app_id(self.app_id.clone())
            .with_env(self.env.as_deref().and_then(MonitorEnv::parse)))
    }

    /// Non-numeric limits fall back to the default; the service clamps the range.
    fn limit_or(&self, default: u32) -> u32 {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .map(|n| n.clamp(0.0, u32::MAX as f64) as u32)
            .unwrap_or(default)
    }
}

/// RFC 3339, zone-less date-time (UTC), or a bare `YYYY-MM-DD` (UTC midnight).
/// Only four-digit years (0000-9999) are accepted.
fn parse_query_datetime(s: &str) -> Option<DateTime<Utc>> {
    let parsed = match parse_occurred_at(s) {
        Some(ms) => DateTime::from_timestamp_millis(ms),
        None => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()),
    };
    parsed.filter(|t| QUERY_YEARS.contains(&t.year()))
}

/// GET /api/v1/dashboard/overview
pub(super) async fn overview_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_query(Utc::now())?;
    let data = state
        .service
        .overview(&query)
        .await
        .map_err(ApiError::internal("DASHBOARD_OVERVIEW_ERROR"))?;
    Ok(Json(data))
}

/// GET /api/v1/dashboard/charts
pub(super) async fn charts_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_query(Utc::now())?;
    let data = state
        .service
        .charts(&query)
        .await
        .map_err(ApiError::internal("DASHBOARD_CHARTS_ERROR"))?;
    Ok(Json(data))
}

/// GET /api/v1/dashboard/routes?type=api|page&limit=1..50
pub(super) async fn routes_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_query(Utc::now())?;
    let route_type = RouteType::parse(params.route_type.as_deref());
    let data = state
        .service
        .routes(&query, route_type, params.limit_or(DEFAULT_ROUTES_LIMIT))
        .await
        .map_err(ApiError::internal("DASHBOARD_ROUTES_ERROR"))?;
    Ok(Json(data))
}

/// GET /api/v1/dashboard/errors?limit=1..100
pub(super) async fn errors_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_query(Utc::now())?;
    let items = state
        .service
        .errors(&query, params.limit_or(DEFAULT_ERRORS_LIMIT))
        .await
        .map_err(ApiError::internal("DASHBOARD_ERRORS_ERROR"))?;
    Ok(Json(serde_json::json!({ "items": items })))
}
