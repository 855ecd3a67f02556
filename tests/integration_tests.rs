// Integration tests: HTTP endpoints over a temp SQLite store

mod common;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::{temp_repo, test_config};
use monitor_server::config::AppConfig;
use monitor_server::routes;
use monitor_server::service::DashboardService;
use serde_json::{Value, json};
use tempfile::TempDir;

async fn test_server() -> (TempDir, TestServer) {
    test_server_with(test_config()).await
}

async fn test_server_with(config: AppConfig) -> (TempDir, TestServer) {
    let (dir, repo) = temp_repo().await;
    let service = Arc::new(DashboardService::new(Arc::new(repo), &config));
    let server = TestServer::new(routes::app(service, &config));
    (dir, server)
}

fn request_event(timestamp: &str, duration: u64) -> Value {
    let ts = common::at(timestamp).timestamp_millis();
    json!({
        "type": "event",
        "timestamp": ts,
        "appId": "shop",
        "env": "prod",
        "data": {
            "name": "request",
            "props": {"url": "/api/orders?page=2", "method": "get", "duration": duration}
        }
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, server) = test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({"ok": true}));
}

#[tokio::test]
async fn test_version_endpoint() {
    let (_dir, server) = test_server().await;
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("monitor-server")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (_dir, server) = test_server().await;
    let response = server.get("/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_collect_then_overview() {
    let (_dir, server) = test_server().await;
    for (ts, d) in [
        ("2024-03-01T10:05:00Z", 50),
        ("2024-03-01T10:10:00Z", 150),
        ("2024-03-01T10:20:00Z", 250),
    ] {
        let response = server
            .post("/api/v1/collect")
            .json(&request_event(ts, d))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    }

    let response = server
        .get("/api/v1/dashboard/overview")
        .add_query_param("from", "2024-03-01T10:00:00Z")
        .add_query_param("to", "2024-03-01T11:00:00Z")
        .add_query_param("appId", "shop")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["kpis"]["requests"], 3);
    assert_eq!(json["kpis"]["p95Latency"], 240.0);
    assert_eq!(json["kpiTrends"]["requests"], 100.0);
    assert_eq!(json["topApiRoutes"][0]["path"], "/api/orders");
    assert_eq!(json["topApiRoutes"][0]["percentage"], 100.0);
    assert_eq!(json["topSlowRequests"][0]["path"], "GET /api/orders");
    assert_eq!(json["topSlowRequests"][0]["requestCount"], 3);
    assert!(json["recentErrors"].as_array().unwrap().is_empty());

    let other_app = server
        .get("/api/v1/dashboard/overview")
        .add_query_param("from", "2024-03-01T10:00:00Z")
        .add_query_param("to", "2024-03-01T11:00:00Z")
        .add_query_param("appId", "admin")
        .await;
    let json: Value = other_app.json();
    assert_eq!(json["kpis"]["requests"], 0);
}

#[tokio::test]
async fn test_collect_rejects_invalid_payloads() {
    let (_dir, server) = test_server().await;

    let response = server
        .post("/api/v1/collect")
        .json(&json!({"type": "metric", "timestamp": 1, "data": {}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["code"], "INVALID_PAYLOAD");

    let response = server
        .post("/api/v1/collect")
        .json(&json!({"type": "event", "timestamp": 1, "data": {"name": ""}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.post("/api/v1/collect").text("{oops").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_collect_error_then_errors_endpoint() {
    let (_dir, server) = test_server().await;
    let ts = common::at("2024-03-01T10:15:00Z").timestamp_millis();
    let response = server
        .post("/api/v1/collect")
        .json(&json!({
            "type": "error",
            "timestamp": ts,
            "data": {"message": "x is undefined", "type": "unhandledrejection", "lineno": 12}
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server
        .get("/api/v1/dashboard/errors")
        .add_query_param("from", "2024-03-01T10:00:00Z")
        .add_query_param("to", "2024-03-01T11:00:00Z")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "promise");
    assert_eq!(items[0]["message"], "x is undefined");
    assert_eq!(items[0]["timestamp"], "2024-03-01T10:15:00.000Z");
    assert_eq!(items[0]["lineno"], 12);
    assert!(items[0].get("stack").is_none());
}

#[tokio::test]
async fn test_routes_endpoint_type_and_limit() {
    let (_dir, server) = test_server().await;
    let ts = common::at("2024-03-01T10:15:00Z").timestamp_millis();
    for url in ["/a", "/a", "/b"] {
        server
            .post("/api/v1/collect")
            .json(&json!({
                "type": "event",
                "timestamp": ts,
                "data": {"name": "page-view", "props": {"url": url}}
            }))
            .await;
    }

    let response = server
        .get("/api/v1/dashboard/routes")
        .add_query_param("from", "2024-03-01T10:00:00Z")
        .add_query_param("to", "2024-03-01T11:00:00Z")
        .add_query_param("type", "page")
        .add_query_param("limit", "1")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["type"], "page");
    assert_eq!(json["routes"], json!([{"path": "/a", "percentage": 100.0}]));

    let response = server
        .get("/api/v1/dashboard/routes")
        .add_query_param("from", "2024-03-01T10:00:00Z")
        .add_query_param("to", "2024-03-01T11:00:00Z")
        .await;
    let json: Value = response.json();
    assert_eq!(json["type"], "api");
    assert_eq!(json["routes"], json!([]));
}

#[tokio::test]
async fn test_charts_endpoint_shape() {
    let (_dir, server) = test_server().await;
    let response = server
        .get("/api/v1/dashboard/charts")
        .add_query_param("from", "2024-03-01")
        .add_query_param("to", "2024-03-01T05:00:00Z")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    for key in [
        "requestErrorTrend",
        "latencyPercentileTrend",
        "resourcePercentileTrend",
        "fcpLcpTrend",
        "clsTrend",
    ] {
        assert!(!json[key].as_array().unwrap().is_empty(), "{key}");
    }
}

#[tokio::test]
async fn test_invalid_query_is_400() {
    let (_dir, server) = test_server().await;

    let response = server
        .get("/api/v1/dashboard/overview")
        .add_query_param("from", "yesterday")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["code"], "INVALID_QUERY");

    let response = server
        .get("/api/v1/dashboard/charts")
        .add_query_param("from", "2024-03-02T00:00:00Z")
        .add_query_param("to", "2024-03-01T00:00:00Z")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn test_out_of_range_datetimes_are_400() {
    let (_dir, server) = test_server().await;
    for path in [
        "/api/v1/dashboard/overview",
        "/api/v1/dashboard/charts",
        "/api/v1/dashboard/routes",
        "/api/v1/dashboard/errors",
    ] {
        let response = server
            .get(path)
            .add_query_param("from", "-200000-01-01T00:00:00")
            .add_query_param("to", "2024-01-01T00:00:00Z")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{path}");
        let json: Value = response.json();
        assert_eq!(json["code"], "INVALID_QUERY");
    }

    let response = server
        .get("/api/v1/dashboard/charts")
        .add_query_param("from", "2000-01-01")
        .add_query_param("to", "2024-01-01")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn test_cors_policies_per_endpoint() {
    let config = AppConfig::load_from_str(&format!(
        "{}{}",
        common::TEST_CONFIG,
        r#"
[cors.collect]
allowed_origins = ["*"]

[cors.dashboard]
allowed_origins = ["https://dash.example.com"]
allow_credentials = true
"#
    ))
    .unwrap();
    let (_dir, server) = test_server_with(config).await;
    let origin = HeaderName::from_static("origin");
    let allow_origin = "access-control-allow-origin";

    let response = server
        .get("/api/v1/dashboard/errors")
        .add_header(origin.clone(), HeaderValue::from_static("https://dash.example.com"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get(allow_origin).unwrap(),
        "https://dash.example.com"
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .unwrap(),
        "true"
    );

    let response = server
        .get("/api/v1/dashboard/errors")
        .add_header(origin.clone(), HeaderValue::from_static("https://evil.example"))
        .await;
    assert!(response.headers().get(allow_origin).is_none());

    let response = server
        .post("/api/v1/collect")
        .add_header(origin, HeaderValue::from_static("https://shop.example"))
        .json(&request_event("2024-03-01T10:05:00Z", 10))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(allow_origin).unwrap(), "*");
}
