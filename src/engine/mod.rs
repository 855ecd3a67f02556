// Telemetry aggregation engine: pure, synchronous transforms from a bounded
// batch of raw rows to dashboard KPIs, chart series and rankings.
//
// Flow: build_windows -> classify each row -> fold into an Aggregate ->
// build_kpis / trends / rankings -> report shapes.

pub mod aggregate;
pub mod classify;
pub mod kpi;
pub mod quantile;
pub mod rank;
pub mod report;
pub mod window;

pub use aggregate::{Aggregate, aggregate_rows, aggregate_rows_in};
pub use classify::{ClassifiedEvent, EventKind, classify};
pub use kpi::{build_kpi_trends, build_kpis, trend_percent};
pub use quantile::{percentile3, quantile};
pub use rank::{to_route_metrics, to_slow_resource_metrics, to_slow_route_metrics};
pub use report::{build_charts, build_overview, build_routes};
pub use window::{Granularity, WindowBucket, build_windows, window_index};
