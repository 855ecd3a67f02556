// Dashboard query and the response contracts consumed by the HTTP layer.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::MonitorEnv;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query: from/to must be valid datetime")]
    InvalidDatetime,
    #[error("Invalid query: from must be earlier than to (from={from}, to={to})")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    #[error("Invalid query: range must not exceed {max_days} days")]
    RangeTooLong { max_days: i64 },
}

/// Longest accepted `[from, to]` span. Bounds the window count (and so the
/// memory) of a single aggregation pass.
pub const MAX_QUERY_RANGE_DAYS: i64 = 366;

/// A validated `[from, to]` query with optional app/env filters.
/// `from <= to` holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    app_id: Option<String>,
    env: Option<MonitorEnv>,
}

impl DashboardQuery {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, QueryError> {
        if from > to {
            return Err(QueryError::InvalidRange { from, to });
        }
        if to - from > TimeDelta::days(MAX_QUERY_RANGE_DAYS) {
            return Err(QueryError::RangeTooLong {
                max_days: MAX_QUERY_RANGE_DAYS,
            });
        }
        Ok(Self {
            from,
            to,
            app_id: None,
            env: None,
        })
    }

    /// Empty app ids are treated as "no filter".
    pub fn with_app_id(mut self, app_id: Option<String>) -> Self {
        self.app_id = app_id.filter(|s| !s.is_empty());
        self
    }

    pub fn with_env(mut self, env: Option<MonitorEnv>) -> Self {
        self.env = env;
        self
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn env(&self) -> Option<MonitorEnv> {
        self.env
    }

    /// The immediately preceding period of the same length (at least 1 ms),
    /// ending at `from`. Filters carry over. Saturates at the earliest
    /// representable instant.
    pub fn previous_period(&self) -> Self {
        let length = (self.to - self.from).max(TimeDelta::milliseconds(1));
        Self {
            from: self
                .from
                .checked_sub_signed(length)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            to: self.from,
            app_id: self.app_id.clone(),
            env: self.env,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpi {
    pub requests: u64,
    pub error_rate: f64,
    pub p75_latency: f64,
    pub p95_latency: f64,
    pub p99_latency: f64,
}

/// Percent change of each KPI versus the previous period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpiTrends {
    pub requests: f64,
    pub error_rate: f64,
    pub p75_latency: f64,
    pub p95_latency: f64,
    pub p99_latency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    #[default]
    Api,
    Page,
}

impl RouteType {
    /// `"page"` selects page routes; anything else falls back to api.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("page") => RouteType::Page,
            _ => RouteType::Api,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetric {
    pub path: String,
    pub percentage: f64,
}

/// Slow request entry. `avg_duration_ms` carries the p95 duration, not a mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowRouteMetric {
    pub path: String,
    pub avg_duration_ms: f64,
    pub request_count: usize,
}

/// Slow resource entry. `avg_duration_ms` is the p95 duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowResourceMetric {
    pub name: String,
    pub initiator_type: String,
    pub avg_duration_ms: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestErrorTrendPoint {
    pub time_window: String,
    pub requests: u64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileTrendPoint {
    pub time_window: String,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
}

/// FCP/LCP percentiles in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcpLcpTrendPoint {
    pub time_window: String,
    pub fcp_p75: f64,
    pub fcp_p90: f64,
    pub fcp_p99: f64,
    pub lcp_p75: f64,
    pub lcp_p90: f64,
    pub lcp_p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClsTrendPoint {
    pub time_window: String,
    pub cls_p75: f64,
    pub cls_p90: f64,
    pub cls_p99: f64,
}

/// Display-ready error entry; absent location fields are omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLog {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub kpis: DashboardKpi,
    pub kpi_trends: DashboardKpiTrends,
    pub recent_errors: Vec<ErrorLog>,
    pub top_api_routes: Vec<RouteMetric>,
    pub top_slow_requests: Vec<SlowRouteMetric>,
    pub top_slow_resources: Vec<SlowResourceMetric>,
    pub top_page_routes: Vec<RouteMetric>,
}

/// Per-window chart series; every series has one point per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub request_error_trend: Vec<RequestErrorTrendPoint>,
    pub latency_percentile_trend: Vec<PercentileTrendPoint>,
    pub resource_percentile_trend: Vec<PercentileTrendPoint>,
    pub fcp_lcp_trend: Vec<FcpLcpTrendPoint>,
    pub cls_trend: Vec<ClsTrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRoutes {
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub routes: Vec<RouteMetric>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn previous_period_has_same_length() {
        let q = DashboardQuery::new(at("2024-03-01T10:00:00Z"), at("2024-03-01T11:00:00Z"))
            .unwrap()
            .with_app_id(Some("shop".into()));
        let prev = q.previous_period();
        assert_eq!(prev.from(), at("2024-03-01T09:00:00Z"));
        assert_eq!(prev.to(), q.from());
        assert_eq!(prev.app_id(), Some("shop"));

        let instant = DashboardQuery::new(q.from(), q.from()).unwrap();
        assert_eq!(
            instant.from() - instant.previous_period().from(),
            TimeDelta::milliseconds(1)
        );
    }

    #[test]
    fn previous_period_saturates_at_min_instant() {
        let from = DateTime::<Utc>::MIN_UTC;
        let q = DashboardQuery::new(from, from + TimeDelta::hours(1)).unwrap();
        let prev = q.previous_period();
        assert_eq!(prev.from(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(prev.to(), from);
    }

    #[test]
    fn rejects_ranges_longer_than_max() {
        let from = at("2024-01-01T00:00:00Z");
        assert!(DashboardQuery::new(from, from + TimeDelta::days(MAX_QUERY_RANGE_DAYS)).is_ok());
        assert_eq!(
            DashboardQuery::new(
                from,
                from + TimeDelta::days(MAX_QUERY_RANGE_DAYS) + TimeDelta::milliseconds(1)
            ),
            Err(QueryError::RangeTooLong {
                max_days: MAX_QUERY_RANGE_DAYS
            })
        );
    }
}
