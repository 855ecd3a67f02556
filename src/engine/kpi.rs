// Period KPIs and period-over-period trends.

use super::quantile::{quantile, round_to, sorted};
use super::window::WindowBucket;
use crate::models::{DashboardKpi, DashboardKpiTrends};

/// Requests and error rate from the window counts; latency percentiles
/// from the pooled samples of the whole range, not per window.
pub fn build_kpis(windows: &[WindowBucket], global_durations: &[f64]) -> DashboardKpi {
    let requests: u64 = windows.iter().map(|w| w.request_count).sum();
    let errors: u64 = windows.iter().map(|w| w.error_count).sum();
    let pool = sorted(global_durations);

    DashboardKpi {
        requests,
        error_rate: if requests == 0 {
            0.0
        } else {
            errors as f64 / requests as f64
        },
        p75_latency: round_to(quantile(&pool, 0.75), 2),
        p95_latency: round_to(quantile(&pool, 0.95), 2),
        p99_latency: round_to(quantile(&pool, 0.99), 2),
    }
}

/// Percent change from `previous` to `current`, 2 decimals.
/// From a zero baseline the change is 0 (still zero) or exactly 100.
pub fn trend_percent(current: f64, previous: f64) -> f64 {
    if !current.is_finite() || !previous.is_finite() {
        return 0.0;
    }
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    round_to((current - previous) / previous * 100.0, 2)
}

pub fn build_kpi_trends(current: &DashboardKpi, previous: &DashboardKpi) -> DashboardKpiTrends {
    DashboardKpiTrends {
        requests: trend_percent(current.requests as f64, previous.requests as f64),
        error_rate: trend_percent(current.error_rate, previous.error_rate),
        p75_latency: trend_percent(current.p75_latency, previous.p75_latency),
        p95_latency: trend_percent(current.p95_latency, previous.p95_latency),
        p99_latency: trend_percent(current.p99_latency, previous.p99_latency),
    }
}
