//! Routes for the order aggregate.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use northwind_core::command::Command;
use northwind_core::model::{
    Order, OrderDeleted, OrderHeader, OrderLine, OrderLineRequest, OrderSummary, Page,
};
use northwind_orders::application::{command_handlers, query_handlers};
use northwind_orders::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request header carrying the caller's correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Query string for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    /// Orders to skip.
    pub skip: Option<u32>,
    /// Maximum orders to return.
    pub take: Option<u32>,
}

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Customer placing the order.
    pub customer_id: String,
    /// Employee handling the order.
    pub employee_id: Option<i32>,
    /// Date by which the customer needs the order.
    pub required_date: Option<DateTime<Utc>>,
    /// Shipping carrier reference.
    pub ship_via: Option<i32>,
    /// Freight charge.
    pub freight: Option<Decimal>,
    /// Recipient name.
    pub ship_name: Option<String>,
    /// Street address.
    pub ship_address: Option<String>,
    /// City.
    pub ship_city: Option<String>,
    /// Region or state.
    pub ship_region: Option<String>,
    /// Postal code.
    pub ship_postal_code: Option<String>,
    /// Country.
    pub ship_country: Option<String>,
    /// Lines to create with the order.
    #[serde(default)]
    pub order_details: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    fn into_parts(self) -> (OrderHeader, Vec<OrderLineRequest>) {
        let header = OrderHeader {
            customer_id: self.customer_id,
            employee_id: self.employee_id,
            required_date: self.required_date,
            ship_via: self.ship_via,
            freight: self.freight,
            ship_name: self.ship_name,
            ship_address: self.ship_address,
            ship_city: self.ship_city,
            ship_region: self.ship_region,
            ship_postal_code: self.ship_postal_code,
            ship_country: self.ship_country,
        };
        (header, self.order_details)
    }
}

/// Uses the caller's correlation id when it is a valid UUID.
fn correlation_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// GET /
#[instrument(skip(state))]
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let page = Page::new(query.skip, query.take);
    let orders = query_handlers::list_orders(page, &*state.gateway).await?;
    Ok(Json(orders))
}

/// GET /{order_id}
#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Order>, ApiError> {
    let order = query_handlers::get_order_by_id(order_id, &*state.gateway).await?;
    Ok(Json(order))
}

/// POST /create
#[instrument(skip_all)]
async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let (header, lines) = request.into_parts();
    let command = commands::CreateOrder {
        correlation_id: correlation_id(&headers),
        header,
        lines,
    };

    info!(
        correlation_id = %command.correlation_id,
        order_id = ?command.target_order_id(),
        "handling {} command",
        command.command_type()
    );

    let order =
        command_handlers::handle_create_order(&command, state.clock.as_ref(), &*state.gateway)
            .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /{order_id}/add-products
#[instrument(skip(state, headers, lines))]
async fn add_products(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
    Json(lines): Json<Vec<OrderLineRequest>>,
) -> Result<Json<Vec<OrderLine>>, ApiError> {
    let command = commands::AddOrderLines {
        correlation_id: correlation_id(&headers),
        order_id,
        lines,
    };

    info!(
        correlation_id = %command.correlation_id,
        order_id = ?command.target_order_id(),
        "handling {} command",
        command.command_type()
    );

    let added = command_handlers::handle_add_order_lines(&command, &*state.gateway).await?;

    Ok(Json(added))
}

/// POST /{order_id}/delete
#[instrument(skip(state, headers))]
async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<OrderDeleted>, ApiError> {
    let command = commands::DeleteOrder {
        correlation_id: correlation_id(&headers),
        order_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        order_id = ?command.target_order_id(),
        "handling {} command",
        command.command_type()
    );

    let deleted = command_handlers::handle_delete_order(&command, &*state.gateway).await?;

    Ok(Json(deleted))
}

/// Returns the router for the order aggregate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/create", post(create_order))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/add-products", post(add_products))
        .route("/{order_id}/delete", post(delete_order))
}
