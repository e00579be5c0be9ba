//! Order and order-line records.
//!
//! The caller-facing shapes (`OrderHeader`, `OrderLineRequest`), the insert
//! shapes handed to a gateway (`NewOrder`, `NewOrderLine`) and the persisted
//! shapes (`OrderSummary`, `OrderLine`, `Order`) are distinct types. Moving
//! data between them goes through the explicit constructors below.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied header fields of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
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
}

/// Caller-supplied fields of one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    /// Product being ordered.
    pub product_id: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Number of units.
    pub quantity: i32,
    /// Fractional discount in `[0, 1)`.
    pub discount: f32,
}

impl OrderLineRequest {
    /// Builds the insert record for this line under `order_id`.
    #[must_use]
    pub fn for_order(&self, order_id: i32) -> NewOrderLine {
        NewOrderLine {
            order_id,
            product_id: self.product_id,
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
        }
    }
}

/// An order header ready for insertion. The store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Server-assigned order date.
    pub order_date: DateTime<Utc>,
    /// Caller-supplied header fields.
    pub header: OrderHeader,
}

/// An order line ready for insertion. The store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    /// Owning order.
    pub order_id: i32,
    /// Product being ordered.
    pub product_id: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Number of units.
    pub quantity: i32,
    /// Fractional discount.
    pub discount: f32,
}

impl NewOrderLine {
    /// Turns this record into the persisted line with the store-assigned id.
    #[must_use]
    pub fn persisted(self, line_id: i32) -> OrderLine {
        OrderLine {
            line_id,
            order_id: self.order_id,
            product_id: self.product_id,
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
        }
    }
}

/// A persisted order header without its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Store-assigned order id.
    pub order_id: i32,
    /// Date the order was placed.
    pub order_date: DateTime<Utc>,
    /// Header fields.
    #[serde(flatten)]
    pub header: OrderHeader,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Store-assigned line id.
    pub line_id: i32,
    /// Owning order.
    pub order_id: i32,
    /// Product being ordered.
    pub product_id: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Number of units.
    pub quantity: i32,
    /// Fractional discount.
    pub discount: f32,
}

/// A fully materialized order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned order id.
    pub order_id: i32,
    /// Date the order was placed.
    pub order_date: DateTime<Utc>,
    /// Header fields.
    #[serde(flatten)]
    pub header: OrderHeader,
    /// Lines owned by this order, ordered by line id.
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Assembles an aggregate from its header and lines.
    #[must_use]
    pub fn from_parts(summary: OrderSummary, lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: summary.order_id,
            order_date: summary.order_date,
            header: summary.header,
            lines,
        }
    }

    /// Returns the header of this order.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_id: self.order_id,
            order_date: self.order_date,
            header: self.header.clone(),
        }
    }
}

/// Paging window for listing orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Number of orders to skip.
    pub offset: Option<u32>,
    /// Maximum number of orders to return.
    pub limit: Option<u32>,
}

impl Page {
    /// A page covering every order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A page skipping `offset` orders and returning at most `limit`.
    #[must_use]
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self { offset, limit }
    }
}

/// Confirmation returned after an order and its lines are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeleted {
    /// The deleted order.
    pub order_id: i32,
    /// Number of lines removed with it.
    pub lines_deleted: u64,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_summary() -> OrderSummary {
        OrderSummary {
            order_id: 10248,
            order_date: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            header: OrderHeader {
                customer_id: "VINET".to_owned(),
                employee_id: Some(5),
                ship_city: Some("Reims".to_owned()),
                ..OrderHeader::default()
            },
        }
    }

    #[test]
    fn test_for_order_copies_every_line_field() {
        let request = OrderLineRequest {
            product_id: 11,
            unit_price: Decimal::new(1400, 2),
            quantity: 12,
            discount: 0.15,
        };

        let line = request.for_order(10248);

        assert_eq!(line.order_id, 10248);
        assert_eq!(line.product_id, 11);
        assert_eq!(line.unit_price, Decimal::new(1400, 2));
        assert_eq!(line.quantity, 12);
        assert!((line.discount - 0.15).abs() < f32::EPSILON);
    }

    #[test]
    fn test_from_parts_keeps_header_and_lines() {
        let line = OrderLineRequest {
            product_id: 42,
            unit_price: Decimal::new(980, 2),
            quantity: 10,
            discount: 0.0,
        }
        .for_order(10248)
        .persisted(1);

        let order = Order::from_parts(sample_summary(), vec![line.clone()]);

        assert_eq!(order.summary(), sample_summary());
        assert_eq!(order.lines, vec![line]);
    }

    #[test]
    fn test_order_serializes_header_fields_flat() {
        let order = Order::from_parts(sample_summary(), Vec::new());

        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["order_id"], 10248);
        assert_eq!(json["customer_id"], "VINET");
        assert_eq!(json["ship_city"], "Reims");
        assert!(json["ship_region"].is_null());
        assert!(json.get("header").is_none());
        assert!(json["lines"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_header_deserializes_with_missing_optional_fields() {
        let header: OrderHeader =
            serde_json::from_value(serde_json::json!({ "customer_id": "HANAR" })).unwrap();

        assert_eq!(header.customer_id, "HANAR");
        assert_eq!(header.employee_id, None);
        assert_eq!(header.freight, None);
    }
}
