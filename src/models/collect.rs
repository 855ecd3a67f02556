// Ingestion payloads sent by the browser SDK to POST /api/v1/collect.
// Validation is shallow: shape checks only, unknown fields ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::MonitorEnv;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub name: String,
    #[serde(default)]
    pub props: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub message: String,
    pub stack: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub filename: Option<String>,
    pub lineno: Option<i64>,
    pub colno: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectBody {
    Event(EventData),
    Error(ErrorData),
}

/// A validated collect payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectPayload {
    /// Client timestamp in epoch milliseconds.
    pub timestamp_ms: i64,
    pub app_id: Option<String>,
    pub env: Option<MonitorEnv>,
    pub release: Option<String>,
    pub user_id: Option<String>,
    pub body: CollectBody,
}

impl CollectPayload {
    /// Returns `None` when the value does not match the SDK schema:
    /// `type` must be "event" or "error", `timestamp` a finite number,
    /// `data` an object with a non-empty `name` (event) or `message` (error).
    pub fn parse(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let timestamp = obj.get("timestamp")?.as_f64().filter(|t| t.is_finite())?;
        let data = obj.get("data")?.as_object()?;

        let body = match obj.get("type")?.as_str()? {
            "event" => {
                let name = non_empty_str(data, "name")?;
                let props = match data.get("props") {
                    Some(p @ Value::Object(_)) => p.clone(),
                    _ => Value::Object(Map::new()),
                };
                CollectBody::Event(EventData { name, props })
            }
            "error" => {
                let message = non_empty_str(data, "message")?;
                CollectBody::Error(ErrorData {
                    message,
                    stack: opt_str(data, "stack"),
                    type_: normalize_error_type(data.get("type").and_then(Value::as_str)),
                    filename: opt_str(data, "filename"),
                    lineno: data.get("lineno").and_then(Value::as_i64),
                    colno: data.get("colno").and_then(Value::as_i64),
                })
            }
            _ => return None,
        };

        Some(Self {
            timestamp_ms: timestamp as i64,
            app_id: opt_str(obj, "appId"),
            env: obj
                .get("env")
                .and_then(Value::as_str)
                .and_then(MonitorEnv::parse),
            release: opt_str(obj, "release"),
            user_id: opt_str(obj, "userId"),
            body,
        })
    }
}

/// Collapse SDK error type aliases so stored `error_type` values stay stable.
pub fn normalize_error_type(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match trimmed.to_lowercase().as_str() {
        "runtime" => "runtime",
        "promise" | "unhandledrejection" => "promise",
        "resource" | "resource-error" => "resource",
        _ => trimmed,
    };
    Some(normalized.to_string())
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn opt_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
