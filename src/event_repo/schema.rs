// Table and index DDL for the event store.

use sqlx::SqlitePool;

/// Creates monitor_events / monitor_errors and their time indexes if not present.
pub(super) async fn init_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monitor_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            occurred_at INTEGER NOT NULL,
            received_at INTEGER NOT NULL,
            event_name TEXT NOT NULL,
            props TEXT,
            app_id TEXT,
            env TEXT,
            release TEXT,
            user_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_events_occurred_at ON monitor_events(occurred_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monitor_errors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            occurred_at INTEGER NOT NULL,
            received_at INTEGER NOT NULL,
            message TEXT NOT NULL,
            error_type TEXT,
            filename TEXT,
            lineno INTEGER,
            colno INTEGER,
            stack TEXT,
            app_id TEXT,
            env TEXT,
            release TEXT,
            user_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_errors_occurred_at ON monitor_errors(occurred_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
