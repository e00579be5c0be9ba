//! Shared application state.

use std::sync::Arc;

use northwind_core::clock::Clock;
use northwind_core::gateway::OrderGateway;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of server-assigned order dates.
    pub clock: Arc<dyn Clock>,
    /// Persistence gateway for orders.
    pub gateway: Arc<dyn OrderGateway>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<dyn OrderGateway>) -> Self {
        Self { clock, gateway }
    }
}
