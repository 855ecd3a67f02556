// Assembles aggregates into the overview / charts / routes response shapes.

use super::aggregate::Aggregate;
use super::kpi::{build_kpi_trends, build_kpis};
use super::quantile::{percentile3, quantile, round_to, sorted};
use super::rank::{to_route_metrics, to_slow_resource_metrics, to_slow_route_metrics};
use super::window::WindowBucket;
use crate::models::{
    ClsTrendPoint, DashboardCharts, DashboardKpi, DashboardOverview, DashboardRoutes, ErrorLog,
    FcpLcpTrendPoint, PercentileTrendPoint, RequestErrorTrendPoint, RouteType,
};

impl Aggregate {
    pub fn kpis(&self) -> DashboardKpi {
        build_kpis(&self.windows, &self.global_durations)
    }
}

/// Overview for the current period, trended against `previous`.
pub fn build_overview(
    current: &Aggregate,
    previous: &Aggregate,
    recent_errors: Vec<ErrorLog>,
    top_n: usize,
) -> DashboardOverview {
    let kpis = current.kpis();
    let kpi_trends = build_kpi_trends(&kpis, &previous.kpis());
    DashboardOverview {
        kpis,
        kpi_trends,
        recent_errors,
        top_api_routes: to_route_metrics(&current.api_routes, top_n),
        top_slow_requests: to_slow_route_metrics(&current.request_durations, top_n),
        top_slow_resources: to_slow_resource_metrics(&current.resource_durations, top_n),
        top_page_routes: to_route_metrics(&current.page_routes, top_n),
    }
}

/// One point per window for each chart series.
pub fn build_charts(agg: &Aggregate) -> DashboardCharts {
    let w = &agg.windows;
    DashboardCharts {
        request_error_trend: w.iter().map(request_error_point).collect(),
        latency_percentile_trend: w
            .iter()
            .map(|b| percentile_point(&b.label, &b.durations))
            .collect(),
        resource_percentile_trend: w
            .iter()
            .map(|b| percentile_point(&b.label, &b.resource_durations))
            .collect(),
        fcp_lcp_trend: w.iter().map(fcp_lcp_point).collect(),
        cls_trend: w.iter().map(cls_point).collect(),
    }
}

pub fn build_routes(agg: &Aggregate, route_type: RouteType, limit: usize) -> DashboardRoutes {
    let counter = match route_type {
        RouteType::Api => &agg.api_routes,
        RouteType::Page => &agg.page_routes,
    };
    DashboardRoutes {
        route_type,
        routes: to_route_metrics(counter, limit),
    }
}

fn request_error_point(b: &WindowBucket) -> RequestErrorTrendPoint {
    RequestErrorTrendPoint {
        time_window: b.label.clone(),
        requests: b.request_count,
        error_rate: if b.request_count == 0 {
            0.0
        } else {
            round_to(b.error_count as f64 / b.request_count as f64, 4)
        },
    }
}

fn percentile_point(label: &str, samples: &[f64]) -> PercentileTrendPoint {
    let s = sorted(samples);
    PercentileTrendPoint {
        time_window: label.to_string(),
        p75: round_to(quantile(&s, 0.75), 2),
        p95: round_to(quantile(&s, 0.95), 2),
        p99: round_to(quantile(&s, 0.99), 2),
    }
}

fn fcp_lcp_point(b: &WindowBucket) -> FcpLcpTrendPoint {
    let fcp = percentile3(&b.fcp_seconds);
    let lcp = percentile3(&b.lcp_seconds);
    FcpLcpTrendPoint {
        time_window: b.label.clone(),
        fcp_p75: round_to(fcp.p75, 3),
        fcp_p90: round_to(fcp.p90, 3),
        fcp_p99: round_to(fcp.p99, 3),
        lcp_p75: round_to(lcp.p75, 3),
        lcp_p90: round_to(lcp.p90, 3),
        lcp_p99: round_to(lcp.p99, 3),
    }
}

fn cls_point(b: &WindowBucket) -> ClsTrendPoint {
    let cls = percentile3(&b.cls_values);
    ClsTrendPoint {
        time_window: b.label.clone(),
        cls_p75: cls.p75,
        cls_p90: cls.p90,
        cls_p99: cls.p99,
    }
}
