// SQLite event/error store. Serves as the row source for the dashboard:
// filtered, capped, time-ordered batches handed to the aggregation engine.

mod schema;

use crate::models::{
    CollectBody, CollectPayload, DashboardQuery, MonitorErrorRow, RawEventRow,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct EventRepo {
    pool: SqlitePool,
}

impl EventRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        schema::init_tables(&self.pool).await
    }

    /// Persist one collected payload into the event or error table.
    #[instrument(skip(self, payload), fields(repo = "events", operation = "save"))]
    pub async fn save(&self, payload: &CollectPayload) -> anyhow::Result<()> {
        let received_at = Utc::now().timestamp_millis();
        match &payload.body {
            CollectBody::Event(data) => {
                let props = serde_json::to_string(&data.props)?;
                sqlx::query(
                    "INSERT INTO monitor_events (occurred_at, received_at, event_name, props, app_id, env, release, user_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(payload.timestamp_ms)
                .bind(received_at)
                .bind(&data.name)
                .bind(&props)
                .bind(payload.app_id.as_deref())
                .bind(payload.env.map(|e| e.as_str()))
                .bind(payload.release.as_deref())
                .bind(payload.user_id.as_deref())
                .execute(&self.pool)
                .await?;
            }
            CollectBody::Error(data) => {
                sqlx::query(
                    "INSERT INTO monitor_errors (occurred_at, received_at, message, error_type, filename, lineno, colno, stack, app_id, env, release, user_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                )
                .bind(payload.timestamp_ms)
                .bind(received_at)
                .bind(&data.message)
                .bind(data.type_.as_deref())
                .bind(data.filename.as_deref())
                .bind(data.lineno)
                .bind(data.colno)
                .bind(data.stack.as_deref())
                .bind(payload.app_id.as_deref())
                .bind(payload.env.map(|e| e.as_str()))
                .bind(payload.release.as_deref())
                .bind(payload.user_id.as_deref())
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Event rows with `from <= occurred_at <= to`, app/env filtered,
    /// ascending, at most `limit` rows.
    #[instrument(
        skip(self, query),
        fields(repo = "events", operation = "fetch_event_rows", from = %query.from(), to = %query.to())
    )]
    pub async fn fetch_event_rows(
        &self,
        query: &DashboardQuery,
        limit: u32,
    ) -> anyhow::Result<Vec<RawEventRow>> {
        let rows = sqlx::query(
            "SELECT occurred_at, event_name, props, app_id, env
             FROM monitor_events
             WHERE occurred_at >= $1 AND occurred_at <= $2
               AND ($3 IS NULL OR app_id = $3)
               AND ($4 IS NULL OR env = $4)
             ORDER BY occurred_at ASC, id ASC
             LIMIT $5",
        )
        .bind(query.from().timestamp_millis())
        .bind(query.to().timestamp_millis())
        .bind(query.app_id())
        .bind(query.env().map(|e| e.as_str()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_event_row(&row)?);
        }
        tracing::debug!(rows = out.len(), "event rows fetched");
        Ok(out)
    }

    /// Error rows in the query range, newest first, at most `limit` rows.
    #[instrument(skip(self, query), fields(repo = "events", operation = "fetch_recent_errors"))]
    pub async fn fetch_recent_errors(
        &self,
        query: &DashboardQuery,
        limit: u32,
    ) -> anyhow::Result<Vec<MonitorErrorRow>> {
        let rows = sqlx::query(
            "SELECT id, occurred_at, message, error_type, filename, lineno, colno, stack, app_id, env
             FROM monitor_errors
             WHERE occurred_at >= $1 AND occurred_at <= $2
               AND ($3 IS NULL OR app_id = $3)
               AND ($4 IS NULL OR env = $4)
             ORDER BY occurred_at DESC, id DESC
             LIMIT $5",
        )
        .bind(query.from().timestamp_millis())
        .bind(query.to().timestamp_millis())
        .bind(query.app_id())
        .bind(query.env().map(|e| e.as_str()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_error_row(&row)?);
        }
        Ok(out)
    }

    fn parse_event_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<RawEventRow> {
        let occurred_at: i64 = row.try_get("occurred_at")?;
        let props_text: Option<String> = row.try_get("props")?;
        Ok(RawEventRow {
            occurred_at: ms_to_rfc3339(occurred_at),
            event_name: row.try_get("event_name")?,
            props: deserialize_props(props_text.as_deref()),
            app_id: row.try_get("app_id")?,
            env: row.try_get("env")?,
        })
    }

    fn parse_error_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<MonitorErrorRow> {
        let occurred_at: i64 = row.try_get("occurred_at")?;
        Ok(MonitorErrorRow {
            id: row.try_get("id")?,
            occurred_at: ms_to_rfc3339(occurred_at),
            message: row.try_get("message")?,
            error_type: row.try_get("error_type")?,
            filename: row.try_get("filename")?,
            lineno: row.try_get("lineno")?,
            colno: row.try_get("colno")?,
            stack: row.try_get("stack")?,
            app_id: row.try_get("app_id")?,
            env: row.try_get("env")?,
        })
    }
}

/// Props stored as JSON text; unreadable text yields null props (the row still counts).
fn deserialize_props(text: Option<&str>) -> serde_json::Value {
    let Some(text) = text else {
        return serde_json::Value::Null;
    };
    serde_json::from_str(text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "props JSON unreadable, using null");
        serde_json::Value::Null
    })
}

fn ms_to_rfc3339(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}
