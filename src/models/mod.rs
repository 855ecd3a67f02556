// Domain models: raw telemetry rows, dashboard query, response contracts.

mod collect;
mod dashboard;
mod event;

pub use collect::{CollectBody, CollectPayload, ErrorData, EventData, normalize_error_type};
pub use dashboard::{
    ClsTrendPoint, DashboardCharts, DashboardKpi, DashboardKpiTrends, DashboardOverview,
    DashboardQuery, DashboardRoutes, ErrorLog, FcpLcpTrendPoint, MAX_QUERY_RANGE_DAYS,
    PercentileTrendPoint, QueryError, RequestErrorTrendPoint, RouteMetric, RouteType,
    SlowResourceMetric, SlowRouteMetric,
};
pub use event::{MonitorEnv, MonitorErrorRow, RawEventRow};
