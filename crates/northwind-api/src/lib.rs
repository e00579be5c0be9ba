//! Northwind Orders: HTTP API.

use axum::Router;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use crate::state::AppState;

/// Builds the application router with every route mounted.
///
/// Transport layers (tracing, CORS) are added by the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/orders", routes::orders::router())
        .with_state(state)
}
