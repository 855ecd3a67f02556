// Dashboard use-cases: fetch row batches from the store, run the aggregation
// engine off the async runtime, and shape the responses. Also ingestion.

use std::sync::Arc;

use tracing::instrument;

use crate::config::AppConfig;
use crate::engine::{self, Aggregate};
use crate::event_repo::EventRepo;
use crate::models::{
    CollectPayload, DashboardCharts, DashboardOverview, DashboardQuery, DashboardRoutes, ErrorLog,
    MonitorErrorRow, RawEventRow, RouteType,
};

/// Route list length bounds for `routes` (default 10).
pub const ROUTES_LIMIT_MAX: u32 = 50;
/// Error list length bounds for `errors` (default 20).
pub const ERRORS_LIMIT_MAX: u32 = 100;

pub struct DashboardService {
    repo: Arc<EventRepo>,
    row_limit: u32,
    top_n: usize,
    recent_errors_limit: u32,
}

impl DashboardService {
    pub fn new(repo: Arc<EventRepo>, config: &AppConfig) -> Self {
        Self {
            repo,
            row_limit: config.database.row_limit,
            top_n: config.dashboard.top_n,
            recent_errors_limit: config.dashboard.recent_errors_limit,
        }
    }

    /// KPIs with trends against the preceding equal-length period, recent
    /// errors, and the top-N rankings. Both periods and the error list are
    /// fetched concurrently; both aggregations run concurrently.
    #[instrument(skip(self, query), fields(operation = "overview"))]
    pub async fn overview(&self, query: &DashboardQuery) -> anyhow::Result<DashboardOverview> {
        let previous_query = query.previous_period();
        let (rows, previous_rows, error_rows) = tokio::try_join!(
            self.repo.fetch_event_rows(query, self.row_limit),
            self.repo.fetch_event_rows(&previous_query, self.row_limit),
            self.repo.fetch_recent_errors(query, self.recent_errors_limit),
        )?;

        let (current, previous) = tokio::try_join!(
            aggregate_blocking(rows, query.clone()),
            aggregate_blocking(previous_rows, previous_query),
        )?;

        Ok(engine::build_overview(
            &current,
            &previous,
            to_error_logs(error_rows),
            self.top_n,
        ))
    }

    #[instrument(skip(self, query), fields(operation = "charts"))]
    pub async fn charts(&self, query: &DashboardQuery) -> anyhow::Result<DashboardCharts> {
        let rows = self.repo.fetch_event_rows(query, self.row_limit).await?;
        let agg = aggregate_blocking(rows, query.clone()).await?;
        Ok(engine::build_charts(&agg))
    }

    #[instrument(skip(self, query), fields(operation = "routes"))]
    pub async fn routes(
        &self,
        query: &DashboardQuery,
        route_type: RouteType,
        limit: u32,
    ) -> anyhow::Result<DashboardRoutes> {
        let limit = limit.clamp(1, ROUTES_LIMIT_MAX);
        let rows = self.repo.fetch_event_rows(query, self.row_limit).await?;
        let agg = aggregate_blocking(rows, query.clone()).await?;
        Ok(engine::build_routes(&agg, route_type, limit as usize))
    }

    #[instrument(skip(self, query), fields(operation = "errors"))]
    pub async fn errors(&self, query: &DashboardQuery, limit: u32) -> anyhow::Result<Vec<ErrorLog>> {
        let limit = limit.clamp(1, ERRORS_LIMIT_MAX);
        let rows = self.repo.fetch_recent_errors(query, limit).await?;
        Ok(to_error_logs(rows))
    }

    pub async fn collect(&self, payload: &CollectPayload) -> anyhow::Result<()> {
        self.repo.save(payload).await
    }
}

/// Runs one aggregation pass on the blocking pool; the batch is moved in.
async fn aggregate_blocking(
    rows: Vec<RawEventRow>,
    query: DashboardQuery,
) -> anyhow::Result<Aggregate> {
    let agg = tokio::task::spawn_blocking(move || engine::aggregate_rows(&rows, &query)).await?;
    Ok(agg)
}

/// Display shape for stored errors. Missing ids fall back to
/// `<occurredAt>-<index>`, missing types to `UnknownError`.
pub fn to_error_logs(rows: Vec<MonitorErrorRow>) -> Vec<ErrorLog> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| ErrorLog {
            id: row
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("{}-{}", row.occurred_at, idx)),
            type_: row.error_type.unwrap_or_else(|| "UnknownError".into()),
            message: row.message,
            timestamp: row.occurred_at,
            filename: row.filename,
            lineno: row.lineno,
            colno: row.colno,
            stack: row.stack,
        })
        .collect()
}
