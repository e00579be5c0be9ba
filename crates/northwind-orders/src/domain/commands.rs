//! Commands for the order aggregate.

use northwind_core::command::Command;
use northwind_core::model::{OrderHeader, OrderLineRequest};
use uuid::Uuid;

/// Command to create an order with its initial lines.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Caller-supplied header fields.
    pub header: OrderHeader,
    /// Lines to create with the order.
    pub lines: Vec<OrderLineRequest>,
}

/// Command to append lines to an existing order.
#[derive(Debug, Clone)]
pub struct AddOrderLines {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to extend.
    pub order_id: i32,
    /// Lines to append.
    pub lines: Vec<OrderLineRequest>,
}

/// Command to delete an order together with its lines.
#[derive(Debug, Clone)]
pub struct DeleteOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to delete.
    pub order_id: i32,
}

impl Command for CreateOrder {
    fn command_type(&self) -> &'static str {
        "orders.create_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_order_id(&self) -> Option<i32> {
        None
    }
}

impl Command for AddOrderLines {
    fn command_type(&self) -> &'static str {
        "orders.add_order_lines"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_order_id(&self) -> Option<i32> {
        Some(self.order_id)
    }
}

impl Command for DeleteOrder {
    fn command_type(&self) -> &'static str {
        "orders.delete_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target_order_id(&self) -> Option<i32> {
        Some(self.order_id)
    }
}
