// Top-N rankings. All sorts are stable, so ties keep first-seen order.

use super::aggregate::{KeyedDurations, ResourceDurations, RouteCounter};
use super::quantile::{quantile, round_to, sorted};
use crate::models::{RouteMetric, SlowResourceMetric, SlowRouteMetric};

/// Top `limit` routes by hit count, with each route's share of the
/// displayed subset. The denominator is the sum over the returned rows,
/// not all traffic, so the percentages add up to 100 across the list.
pub fn to_route_metrics(counter: &RouteCounter, limit: usize) -> Vec<RouteMetric> {
    let mut entries: Vec<(&str, u64)> = counter.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(limit);

    let total: u64 = entries.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return Vec::new();
    }
    entries
        .into_iter()
        .map(|(path, count)| RouteMetric {
            path: path.to_string(),
            percentage: round_to(count as f64 / total as f64 * 100.0, 2),
        })
        .collect()
}

/// Slowest `limit` keys by p95 duration (reported as `avg_duration_ms`).
pub fn to_slow_route_metrics(durations: &KeyedDurations, limit: usize) -> Vec<SlowRouteMetric> {
    let mut out: Vec<SlowRouteMetric> = durations
        .iter()
        .map(|stats| SlowRouteMetric {
            path: stats.key.clone(),
            avg_duration_ms: p95(&stats.durations),
            request_count: stats.durations.len(),
        })
        .collect();
    out.sort_by(|a, b| b.avg_duration_ms.total_cmp(&a.avg_duration_ms));
    out.truncate(limit);
    out
}

/// Slowest `limit` resources by p95 duration (reported as `avg_duration_ms`).
pub fn to_slow_resource_metrics(
    durations: &ResourceDurations,
    limit: usize,
) -> Vec<SlowResourceMetric> {
    let mut out: Vec<SlowResourceMetric> = durations
        .iter()
        .map(|stats| SlowResourceMetric {
            name: stats.name.clone(),
            initiator_type: stats.initiator_type.clone(),
            avg_duration_ms: p95(&stats.durations),
            sample_count: stats.durations.len(),
        })
        .collect();
    out.sort_by(|a, b| b.avg_duration_ms.total_cmp(&a.avg_duration_ms));
    out.truncate(limit);
    out
}

fn p95(durations: &[f64]) -> f64 {
    round_to(quantile(&sorted(durations), 0.95), 2)
}
