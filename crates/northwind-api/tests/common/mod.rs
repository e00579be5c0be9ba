//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use northwind_core::clock::Clock;
use northwind_core::gateway::OrderGateway;
use northwind_store::PgOrderGateway;
use northwind_test_support::{FixedClock, InMemoryOrderGateway};
use sqlx::PgPool;
use tower::ServiceExt;

use northwind_api::build_router;
use northwind_api::state::AppState;

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::standard())
}

/// Build the full app router over an in-memory gateway the test keeps a
/// handle to.
pub fn build_test_app(gateway: &InMemoryOrderGateway) -> Router {
    build_app_with(Arc::new(gateway.clone()))
}

/// Build the full app router over a real `PgOrderGateway`.
pub fn build_pg_test_app(pool: PgPool) -> Router {
    build_app_with(Arc::new(PgOrderGateway::new(pool)))
}

fn build_app_with(gateway: Arc<dyn OrderGateway>) -> Router {
    build_router(AppState::new(fixed_clock(), gateway))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
