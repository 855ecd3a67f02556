// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use monitor_server::config::AppConfig;
use monitor_server::event_repo::EventRepo;
use monitor_server::models::{CollectBody, CollectPayload, EventData, RawEventRow};
use serde_json::Value;
use tempfile::TempDir;

pub const TEST_CONFIG: &str = r#"
[server]
port = 4000
host = "127.0.0.1"

[database]
path = "data/test.db"
max_pool_size = 2
"#;

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn row(occurred_at: &str, event_name: &str, props: Value) -> RawEventRow {
    RawEventRow::new(occurred_at, event_name, props)
}

pub fn event_payload(occurred_at: &str, name: &str, props: Value) -> CollectPayload {
    CollectPayload {
        timestamp_ms: at(occurred_at).timestamp_millis(),
        app_id: None,
        env: None,
        release: None,
        user_id: None,
        body: CollectBody::Event(EventData {
            name: name.into(),
            props,
        }),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

/// Fresh, initialized repo in a temp dir. Keep the `TempDir` alive for the test.
pub async fn temp_repo() -> (TempDir, EventRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor.db");
    let repo = EventRepo::connect(path.to_str().unwrap(), 2).await.unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}
