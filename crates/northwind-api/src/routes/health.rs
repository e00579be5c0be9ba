//! Health check endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use northwind_core::model::Page;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

impl HealthResponse {
    fn with_status(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::with_status("ok"))
}

/// GET /health/ready
///
/// Ready once the order store answers a one-row listing.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.gateway.list_orders(Page::new(None, Some(1))).await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse::with_status("ready"))),
        Err(err) => {
            warn!(error = %err, "order store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::with_status("unavailable")),
            )
        }
    }
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}
