//! Integration tests for the health endpoints.

mod common;

use axum::http::StatusCode;
use northwind_test_support::InMemoryOrderGateway;

#[tokio::test]
async fn test_health_returns_ok_with_version() {
    let app = common::build_test_app(&InMemoryOrderGateway::new());

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_ready_returns_ok_over_empty_store() {
    let app = common::build_test_app(&InMemoryOrderGateway::new());

    let (status, json) = common::get_json(app, "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}
