// Raw rows as handed over by the row source. Props stay untyped here;
// engine::classify turns them into typed events.

use serde::{Deserialize, Serialize};

/// Deployment environment tag attached to every collected payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorEnv {
    Dev,
    Test,
    Prod,
}

impl MonitorEnv {
    /// Parse a query/config value; anything other than dev|test|prod is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dev" => Some(MonitorEnv::Dev),
            "test" => Some(MonitorEnv::Test),
            "prod" => Some(MonitorEnv::Prod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorEnv::Dev => "dev",
            MonitorEnv::Test => "test",
            MonitorEnv::Prod => "prod",
        }
    }
}

/// One stored telemetry event. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRow {
    /// RFC 3339 timestamp; rows whose timestamp does not parse are dropped by the aggregator.
    pub occurred_at: String,
    pub event_name: String,
    #[serde(default)]
    pub props: serde_json::Value,
    pub app_id: Option<String>,
    pub env: Option<String>,
}

impl RawEventRow {
    pub fn new(
        occurred_at: impl Into<String>,
        event_name: impl Into<String>,
        props: serde_json::Value,
    ) -> Self {
        Self {
            occurred_at: occurred_at.into(),
            event_name: event_name.into(),
            props,
            app_id: None,
            env: None,
        }
    }
}

/// One stored error report, newest first when read back for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorErrorRow {
    pub id: Option<i64>,
    pub occurred_at: String,
    pub message: String,
    pub error_type: Option<String>,
    pub filename: Option<String>,
    pub lineno: Option<i64>,
    pub colno: Option<i64>,
    pub stack: Option<String>,
    pub app_id: Option<String>,
    pub env: Option<String>,
}
