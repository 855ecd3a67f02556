// Typed boundary over untyped event props.
// Every leniency rule (numeric strings, missing fields, bad URLs) lives here;
// malformed values become `None` and never an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::RawEventRow;

const UNKNOWN: &str = "[unknown]";

/// The event names the aggregator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Request,
    PageView,
    PerformancePaint,
    PerformanceResource,
    PerformanceListening,
}

impl EventKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "request" => Some(EventKind::Request),
            "page-view" => Some(EventKind::PageView),
            "performance-paint" => Some(EventKind::PerformancePaint),
            "performance-resource" => Some(EventKind::PerformanceResource),
            "performance-listening" => Some(EventKind::PerformanceListening),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSample {
    /// Milliseconds; only finite, non-negative values survive.
    pub duration_ms: Option<f64>,
    pub path: Option<String>,
    /// Uppercased, `GET` when missing.
    pub method: String,
    pub is_error: bool,
}

impl RequestSample {
    /// `"METHOD path"`, with `[unknown]` standing in for an unparseable path.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path.as_deref().unwrap_or(UNKNOWN))
    }

    /// The path when it is an API route (`/api` prefix).
    pub fn api_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| p.starts_with("/api"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub name: String,
    pub initiator_type: String,
    pub duration_ms: f64,
}

impl ResourceSample {
    /// `"initiatorType|name"`
    pub fn key(&self) -> String {
        format!("{}|{}", self.initiator_type, self.name)
    }
}

/// One row's contribution, typed by event kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    Request(RequestSample),
    PageView { path: Option<String> },
    Paint { fcp_seconds: Option<f64> },
    Resource(Vec<ResourceSample>),
    Listening { lcp_seconds: Option<f64>, cls: Option<f64> },
}

/// Extracts the typed metrics of one row. Unknown event names yield `None`.
pub fn classify(row: &RawEventRow) -> Option<ClassifiedEvent> {
    let props = &row.props;
    let event = match EventKind::parse(&row.event_name)? {
        EventKind::Request => ClassifiedEvent::Request(RequestSample {
            duration_ms: non_negative(props.get("duration")),
            path: extract_path(props.get("url")),
            method: to_http_method(props.get("method")),
            is_error: is_error(props),
        }),
        EventKind::PageView => ClassifiedEvent::PageView {
            path: extract_path(props.get("url")),
        },
        EventKind::PerformancePaint => ClassifiedEvent::Paint {
            fcp_seconds: non_negative(props.get("paints").and_then(|p| p.get("fcp")))
                .map(|ms| ms / 1000.0),
        },
        EventKind::PerformanceResource => {
            ClassifiedEvent::Resource(to_resource_samples(props.get("resources")))
        }
        EventKind::PerformanceListening => ClassifiedEvent::Listening {
            lcp_seconds: non_negative(props.get("lcp")).map(|ms| ms / 1000.0),
            cls: non_negative(props.get("cls")),
        },
    };
    Some(event)
}

/// Epoch milliseconds of an `occurredAt` value. Accepts RFC 3339 and
/// zone-less `YYYY-MM-DD[T ]HH:MM:SS[.fff]` (read as UTC).
pub fn parse_occurred_at(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Finite numbers, or strings that parse to one. A blank string reads as 0.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn non_negative(value: Option<&Value>) -> Option<f64> {
    to_number(value).filter(|n| *n >= 0.0)
}

/// Pathname of an absolute `http(s)://` URL, or the part of a relative path
/// before `?`. Empty paths become `/`; blank or unparseable input is `None`.
pub fn extract_path(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?;
    if raw.trim().is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        let url = url::Url::parse(raw).ok()?;
        let path = url.path();
        return Some(if path.is_empty() { "/" } else { path }.to_string());
    }
    let path = raw.split('?').next().unwrap_or_default();
    Some(if path.is_empty() { "/" } else { path }.to_string())
}

fn to_http_method(value: Option<&Value>) -> String {
    let method = value
        .and_then(Value::as_str)
        .map(|m| m.trim().to_uppercase())
        .unwrap_or_default();
    if method.is_empty() {
        "GET".to_string()
    } else {
        method
    }
}

/// `ok === false`, or a numeric status of 400 or above.
fn is_error(props: &Value) -> bool {
    let not_ok = matches!(props.get("ok"), Some(Value::Bool(false)));
    let bad_status = to_number(props.get("status")).is_some_and(|s| s >= 400.0);
    not_ok || bad_status
}

fn to_resource_samples(value: Option<&Value>) -> Vec<ResourceSample> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| {
            let duration_ms = non_negative(item.get("duration"))?;
            let name = item
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string();
            let initiator = item
                .get("initiatorType")
                .and_then(Value::as_str)
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_default();
            let initiator_type = if initiator == "image" {
                "img".to_string()
            } else {
                initiator
            };
            Some(ResourceSample {
                name,
                initiator_type,
                duration_ms,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(name: &str, props: Value) -> RawEventRow {
        RawEventRow::new("2024-03-01T10:00:00.000Z", name, props)
    }

    #[test]
    fn request_fields() {
        let ev = classify(&row(
            "request",
            json!({"duration": "120.5", "url": "https://shop.test/api/cart?x=1", "method": " post ", "status": 502}),
        ));
        assert_eq!(
            ev,
            Some(ClassifiedEvent::Request(RequestSample {
                duration_ms: Some(120.5),
                path: Some("/api/cart".into()),
                method: "POST".into(),
                is_error: true,
            }))
        );
    }

    #[test]
    fn request_defaults_and_error_flags() {
        let Some(ClassifiedEvent::Request(r)) =
            classify(&row("request", json!({"duration": -3, "ok": false})))
        else {
            panic!("expected request");
        };
        assert_eq!(r.duration_ms, None);
        assert_eq!(r.path, None);
        assert_eq!(r.method, "GET");
        assert!(r.is_error);
        assert_eq!(r.key(), "GET [unknown]");

        let Some(ClassifiedEvent::Request(r)) =
            classify(&row("request", json!({"ok": "false", "status": "399"})))
        else {
            panic!("expected request");
        };
        assert!(!r.is_error);
    }

    #[test]
    fn null_props_never_panic() {
        for name in [
            "request",
            "page-view",
            "performance-paint",
            "performance-resource",
            "performance-listening",
        ] {
            assert!(classify(&row(name, Value::Null)).is_some());
        }
        assert_eq!(classify(&row("click", json!({}))), None);
    }

    #[test]
    fn path_extraction() {
        let p = |v: Value| extract_path(Some(&v));
        assert_eq!(p(json!("/api/v1/x?foo=1")), Some("/api/v1/x".into()));
        assert_eq!(p(json!("https://a.com")), Some("/".into()));
        assert_eq!(p(json!("?only=query")), Some("/".into()));
        assert_eq!(p(json!("   ")), None);
        assert_eq!(p(json!("http://[bad")), None);
        assert_eq!(p(json!(42)), None);
        assert_eq!(extract_path(None), None);
    }

    #[test]
    fn lenient_numbers() {
        let n = |v: Value| to_number(Some(&v));
        assert_eq!(n(json!(3)), Some(3.0));
        assert_eq!(n(json!(" 2.5 ")), Some(2.5));
        assert_eq!(n(json!("")), Some(0.0));
        assert_eq!(n(json!("abc")), None);
        assert_eq!(n(json!("inf")), None);
        assert_eq!(n(json!(true)), None);
        assert_eq!(n(Value::Null), None);
    }

    #[test]
    fn paint_and_listening_convert_to_seconds() {
        assert_eq!(
            classify(&row("performance-paint", json!({"paints": {"fcp": 1500}}))),
            Some(ClassifiedEvent::Paint {
                fcp_seconds: Some(1.5)
            })
        );
        assert_eq!(
            classify(&row("performance-listening", json!({"lcp": 2500, "cls": 0.12}))),
            Some(ClassifiedEvent::Listening {
                lcp_seconds: Some(2.5),
                cls: Some(0.12)
            })
        );
        assert_eq!(
            classify(&row("performance-listening", json!({"cls": -1}))),
            Some(ClassifiedEvent::Listening {
                lcp_seconds: None,
                cls: None
            })
        );
    }

    #[test]
    fn resource_entries_are_filtered_and_normalized() {
        let ev = classify(&row(
            "performance-resource",
            json!({"resources": [
                {"name": " /logo.png ", "initiatorType": "IMAGE", "duration": 30},
                {"name": "", "initiatorType": "script", "duration": "12"},
                {"name": "/bad.js", "initiatorType": "script", "duration": -1},
                {"name": "/nan.js", "initiatorType": "script"},
                "not-an-object",
                null
            ]}),
        ));
        let Some(ClassifiedEvent::Resource(samples)) = ev else {
            panic!("expected resources");
        };
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].key(), "img|/logo.png");
        assert_eq!(samples[1].key(), "script|[unknown]");
        assert_eq!(samples[1].duration_ms, 12.0);
    }

    #[test]
    fn occurred_at_formats() {
        assert_eq!(parse_occurred_at("1970-01-01T00:00:01.500Z"), Some(1500));
        assert_eq!(parse_occurred_at("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_occurred_at("1970-01-01 00:00:02"), Some(2000));
        assert_eq!(parse_occurred_at("yesterday"), None);
        assert_eq!(parse_occurred_at(""), None);
    }
}
