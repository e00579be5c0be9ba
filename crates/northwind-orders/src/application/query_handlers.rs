//! Query handlers for the order aggregate.

use northwind_core::error::DomainError;
use northwind_core::gateway::OrderGateway;
use northwind_core::model::{Order, OrderSummary, Page};
use tracing::instrument;

use crate::domain::validation;

/// Lists order headers in ascending order id.
///
/// `page.offset` orders are skipped and at most `page.limit` are returned.
/// An empty result is not an error.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `page.limit` is zero.
/// Returns `DomainError::Store` if the gateway fails.
#[instrument(skip(gateway), fields(offset = ?page.offset, limit = ?page.limit))]
pub async fn list_orders(
    page: Page,
    gateway: &dyn OrderGateway,
) -> Result<Vec<OrderSummary>, DomainError> {
    validation::validate_page(page)?;
    gateway.list_orders(page).await
}

/// Retrieves an order with its lines.
///
/// # Errors
///
/// Returns `DomainError::OrderNotFound` if no order has this id.
/// Returns `DomainError::Store` if the gateway fails.
#[instrument(skip(gateway))]
pub async fn get_order_by_id(
    order_id: i32,
    gateway: &dyn OrderGateway,
) -> Result<Order, DomainError> {
    gateway
        .find_order(order_id)
        .await?
        .ok_or(DomainError::OrderNotFound(order_id))
}

#[cfg(test)]
mod tests {
    use northwind_core::error::DomainError;
    use northwind_core::model::{OrderHeader, OrderLineRequest, Page};
    use northwind_test_support::{
        FailPoint, FailingOrderGateway, FixedClock, InMemoryOrderGateway,
    };
    use rust_decimal::Decimal;

    use crate::application::query_handlers::{get_order_by_id, list_orders};

    fn seeded_gateway(orders: usize) -> InMemoryOrderGateway {
        let gateway = InMemoryOrderGateway::new();
        for _ in 0..orders {
            gateway.seed_order(
                FixedClock::standard().0,
                OrderHeader {
                    customer_id: "HANAR".to_owned(),
                    ..OrderHeader::default()
                },
                &[OrderLineRequest {
                    product_id: 72,
                    unit_price: Decimal::new(3480, 2),
                    quantity: 5,
                    discount: 0.0,
                }],
            );
        }
        gateway
    }

    fn ids(orders: &[northwind_core::model::OrderSummary]) -> Vec<i32> {
        orders.iter().map(|order| order.order_id).collect()
    }

    #[tokio::test]
    async fn test_list_orders_without_paging_returns_all() {
        // Arrange
        let gateway = seeded_gateway(4);

        // Act
        let orders = list_orders(Page::all(), &gateway).await.unwrap();

        // Assert
        assert_eq!(ids(&orders), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_list_orders_applies_offset_and_limit() {
        // Arrange
        let gateway = seeded_gateway(6);

        // Act
        let skipped = list_orders(Page::new(Some(2), None), &gateway).await.unwrap();
        let limited = list_orders(Page::new(None, Some(2)), &gateway).await.unwrap();
        let window = list_orders(Page::new(Some(3), Some(2)), &gateway).await.unwrap();

        // Assert
        assert_eq!(ids(&skipped), vec![3, 4, 5, 6]);
        assert_eq!(ids(&limited), vec![1, 2]);
        assert_eq!(ids(&window), vec![4, 5]);
    }

    #[tokio::test]
    async fn test_list_orders_past_the_end_returns_empty() {
        // Arrange
        let gateway = seeded_gateway(2);

        // Act
        let orders = list_orders(Page::new(Some(10), Some(5)), &gateway)
            .await
            .unwrap();

        // Assert
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_rejects_zero_limit() {
        // Arrange
        let gateway = seeded_gateway(1);

        // Act
        let result = list_orders(Page::new(None, Some(0)), &gateway).await;

        // Assert
        match result {
            Err(DomainError::Validation { field, .. }) => assert_eq!(field, "limit"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_order_by_id_returns_order_with_lines() {
        // Arrange
        let gateway = seeded_gateway(2);

        // Act
        let order = get_order_by_id(2, &gateway).await.unwrap();

        // Assert
        assert_eq!(order.order_id, 2);
        assert_eq!(order.header.customer_id, "HANAR");
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].order_id, 2);
    }

    #[tokio::test]
    async fn test_get_order_by_id_returns_not_found_for_missing_order() {
        // Arrange
        let gateway = seeded_gateway(1);

        // Act
        let result = get_order_by_id(99, &gateway).await;

        // Assert
        match result {
            Err(DomainError::OrderNotFound(id)) => assert_eq!(id, 99),
            other => panic!("expected OrderNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_queries_surface_store_failure() {
        // Act
        let listed = list_orders(Page::all(), &FailingOrderGateway).await;
        let fetched = get_order_by_id(1, &FailingOrderGateway).await;

        // Assert
        assert!(matches!(listed, Err(DomainError::Store(_))));
        assert!(matches!(fetched, Err(DomainError::Store(_))));
    }

    #[tokio::test]
    async fn test_get_order_by_id_surfaces_read_failure_instead_of_not_found() {
        // Arrange
        let gateway = seeded_gateway(1);
        gateway.fail_at(FailPoint::Read);

        // Act
        let fetched = get_order_by_id(1, &gateway).await;
        let listed = list_orders(Page::all(), &gateway).await;

        // Assert
        assert!(matches!(fetched, Err(DomainError::Store(_))));
        assert!(matches!(listed, Err(DomainError::Store(_))));
    }
}
