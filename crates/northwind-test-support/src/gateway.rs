//! Test gateways: in-memory `OrderGateway` implementations for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use northwind_core::error::DomainError;
use northwind_core::gateway::{OrderGateway, OrderUnitOfWork};
use northwind_core::model::{
    NewOrder, NewOrderLine, Order, OrderHeader, OrderLine, OrderLineRequest, OrderSummary, Page,
};

/// A gateway step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Gateway-level reads: `list_orders`, `find_order`, `find_lines`.
    Read,
    /// Opening a unit of work.
    Begin,
    /// `OrderUnitOfWork::insert_order`.
    InsertOrder,
    /// `OrderUnitOfWork::insert_lines`.
    InsertLines,
    /// `OrderUnitOfWork::delete_lines`.
    DeleteLines,
    /// `OrderUnitOfWork::delete_order`.
    DeleteOrder,
    /// `OrderUnitOfWork::commit`.
    Commit,
    /// `OrderUnitOfWork::rollback`.
    Rollback,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: BTreeMap<i32, OrderSummary>,
    lines: BTreeMap<i32, OrderLine>,
}

impl Tables {
    fn lines_of(&self, order_id: i32) -> Vec<OrderLine> {
        self.lines
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect()
    }

    fn apply(&mut self, write: &Write) -> Result<(), DomainError> {
        match write {
            Write::InsertOrder(summary) => {
                self.orders.insert(summary.order_id, summary.clone());
            }
            Write::InsertLine(line) => {
                if !self.orders.contains_key(&line.order_id) {
                    return Err(DomainError::Store(format!(
                        "foreign key violation: order {} does not exist",
                        line.order_id
                    )));
                }
                self.lines.insert(line.line_id, line.clone());
            }
            Write::DeleteLine(line_id) => {
                self.lines.remove(line_id);
            }
            Write::DeleteOrder(order_id) => {
                if self.lines.values().any(|line| line.order_id == *order_id) {
                    return Err(DomainError::Store(format!(
                        "foreign key violation: order {order_id} still has lines"
                    )));
                }
                if self.orders.remove(order_id).is_none() {
                    return Err(DomainError::OrderNotFound(*order_id));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Write {
    InsertOrder(OrderSummary),
    InsertLine(OrderLine),
    DeleteLine(i32),
    DeleteOrder(i32),
}

#[derive(Debug)]
struct Shared {
    tables: Mutex<Tables>,
    next_order_id: AtomicI32,
    next_line_id: AtomicI32,
    open_units: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_at: Mutex<Option<FailPoint>>,
}

impl Shared {
    fn check(&self, point: FailPoint) -> Result<(), DomainError> {
        if *self.fail_at.lock().unwrap() == Some(point) {
            return Err(DomainError::Store(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

/// An order gateway backed by in-process tables.
///
/// Each unit of work stages its writes against a snapshot taken at `begin`
/// and replays them onto the shared tables on commit, re-checking the
/// order/line foreign key. Ids come from shared sequences, so a rolled-back
/// unit leaves a gap, as a database sequence would.
///
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct InMemoryOrderGateway {
    shared: Arc<Shared>,
}

impl Default for InMemoryOrderGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                next_order_id: AtomicI32::new(1),
                next_line_id: AtomicI32::new(1),
                open_units: AtomicUsize::new(0),
                commits: AtomicUsize::new(0),
                rollbacks: AtomicUsize::new(0),
                fail_at: Mutex::new(None),
            }),
        }
    }

    /// Makes every subsequent call at `point` fail with `DomainError::Store`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_at(&self, point: FailPoint) {
        *self.shared.fail_at.lock().unwrap() = Some(point);
    }

    /// Removes any injected failure.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear_failure(&self) {
        *self.shared.fail_at.lock().unwrap() = None;
    }

    /// Writes an order with its lines directly, bypassing units of work.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_order(
        &self,
        order_date: DateTime<Utc>,
        header: OrderHeader,
        lines: &[OrderLineRequest],
    ) -> Order {
        let order_id = self.shared.next_order_id.fetch_add(1, Ordering::SeqCst);
        let summary = OrderSummary {
            order_id,
            order_date,
            header,
        };
        let lines: Vec<OrderLine> = lines
            .iter()
            .map(|request| {
                let line_id = self.shared.next_line_id.fetch_add(1, Ordering::SeqCst);
                request.for_order(order_id).persisted(line_id)
            })
            .collect();

        let mut tables = self.shared.tables.lock().unwrap();
        tables.orders.insert(order_id, summary.clone());
        for line in &lines {
            tables.lines.insert(line.line_id, line.clone());
        }
        Order::from_parts(summary, lines)
    }

    /// Number of committed orders.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn order_count(&self) -> usize {
        self.shared.tables.lock().unwrap().orders.len()
    }

    /// Number of committed lines across all orders.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn line_count(&self) -> usize {
        self.shared.tables.lock().unwrap().lines.len()
    }

    /// Units of work that have been opened and not yet dropped.
    pub fn open_units(&self) -> usize {
        self.shared.open_units.load(Ordering::SeqCst)
    }

    /// Units of work that committed successfully.
    pub fn commits(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Units of work that ended without committing.
    pub fn rollbacks(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderGateway {
    async fn list_orders(&self, page: Page) -> Result<Vec<OrderSummary>, DomainError> {
        self.shared.check(FailPoint::Read)?;
        let tables = self.shared.tables.lock().unwrap();
        let offset = page.offset.unwrap_or(0) as usize;
        let limit = page.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(tables
            .orders
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_order(&self, order_id: i32) -> Result<Option<Order>, DomainError> {
        self.shared.check(FailPoint::Read)?;
        let tables = self.shared.tables.lock().unwrap();
        Ok(tables
            .orders
            .get(&order_id)
            .cloned()
            .map(|summary| Order::from_parts(summary, tables.lines_of(order_id))))
    }

    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        self.shared.check(FailPoint::Read)?;
        Ok(self.shared.tables.lock().unwrap().lines_of(order_id))
    }

    async fn begin(&self) -> Result<Box<dyn OrderUnitOfWork>, DomainError> {
        self.shared.check(FailPoint::Begin)?;
        let working = self.shared.tables.lock().unwrap().clone();
        self.shared.open_units.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            working,
            journal: Vec::new(),
            committed: false,
        }))
    }
}

struct InMemoryUnitOfWork {
    shared: Arc<Shared>,
    working: Tables,
    journal: Vec<Write>,
    committed: bool,
}

impl InMemoryUnitOfWork {
    fn stage(&mut self, write: Write) -> Result<(), DomainError> {
        self.working.apply(&write)?;
        self.journal.push(write);
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.committed {
            self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        }
        self.shared.open_units.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderUnitOfWork for InMemoryUnitOfWork {
    async fn find_order(&mut self, order_id: i32) -> Result<Option<OrderSummary>, DomainError> {
        Ok(self.working.orders.get(&order_id).cloned())
    }

    async fn find_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        Ok(self.working.lines_of(order_id))
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<i32, DomainError> {
        self.shared.check(FailPoint::InsertOrder)?;
        let order_id = self.shared.next_order_id.fetch_add(1, Ordering::SeqCst);
        self.stage(Write::InsertOrder(OrderSummary {
            order_id,
            order_date: order.order_date,
            header: order.header.clone(),
        }))?;
        Ok(order_id)
    }

    async fn insert_lines(&mut self, lines: &[NewOrderLine]) -> Result<Vec<i32>, DomainError> {
        self.shared.check(FailPoint::InsertLines)?;
        let mut line_ids = Vec::with_capacity(lines.len());
        for line in lines {
            let line_id = self.shared.next_line_id.fetch_add(1, Ordering::SeqCst);
            self.stage(Write::InsertLine(line.clone().persisted(line_id)))?;
            line_ids.push(line_id);
        }
        Ok(line_ids)
    }

    async fn delete_lines(&mut self, lines: &[OrderLine]) -> Result<u64, DomainError> {
        self.shared.check(FailPoint::DeleteLines)?;
        let mut deleted = 0;
        for line in lines {
            if self.working.lines.contains_key(&line.line_id) {
                self.stage(Write::DeleteLine(line.line_id))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_order(&mut self, order: &OrderSummary) -> Result<(), DomainError> {
        self.shared.check(FailPoint::DeleteOrder)?;
        self.stage(Write::DeleteOrder(order.order_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = self;
        this.shared.check(FailPoint::Commit)?;

        let mut tables = this.shared.tables.lock().unwrap();
        let mut next = tables.clone();
        for write in &this.journal {
            next.apply(write)?;
        }
        *tables = next;
        drop(tables);

        this.committed = true;
        this.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.shared.check(FailPoint::Rollback)
    }
}

/// An order gateway that always returns a store failure. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingOrderGateway;

fn connection_refused() -> DomainError {
    DomainError::Store("connection refused".into())
}

#[async_trait]
impl OrderGateway for FailingOrderGateway {
    async fn list_orders(&self, _page: Page) -> Result<Vec<OrderSummary>, DomainError> {
        Err(connection_refused())
    }

    async fn find_order(&self, _order_id: i32) -> Result<Option<Order>, DomainError> {
        Err(connection_refused())
    }

    async fn find_lines(&self, _order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        Err(connection_refused())
    }

    async fn begin(&self) -> Result<Box<dyn OrderUnitOfWork>, DomainError> {
        Err(connection_refused())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::FixedClock;
    use northwind_core::clock::Clock;

    fn header() -> OrderHeader {
        OrderHeader {
            customer_id: "VINET".to_owned(),
            ..OrderHeader::default()
        }
    }

    fn line_request(product_id: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            unit_price: Decimal::new(1000, 2),
            quantity: 1,
            discount: 0.0,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible_and_discarded_on_drop() {
        // Arrange
        let gateway = InMemoryOrderGateway::new();
        let mut unit = gateway.begin().await.unwrap();

        // Act
        let order_id = unit
            .insert_order(&NewOrder {
                order_date: FixedClock::standard().now(),
                header: header(),
            })
            .await
            .unwrap();
        let visible_before_drop = gateway.find_order(order_id).await.unwrap();
        drop(unit);

        // Assert
        assert!(visible_before_drop.is_none());
        assert_eq!(gateway.order_count(), 0);
        assert_eq!(gateway.open_units(), 0);
        assert_eq!(gateway.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_failed_rollback_still_discards_staged_writes() {
        // Arrange
        let gateway = InMemoryOrderGateway::new();
        let mut unit = gateway.begin().await.unwrap();
        unit.insert_order(&NewOrder {
            order_date: FixedClock::standard().now(),
            header: header(),
        })
        .await
        .unwrap();
        gateway.fail_at(FailPoint::Rollback);

        // Act
        let result = unit.rollback().await;

        // Assert
        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(gateway.order_count(), 0);
        assert_eq!(gateway.open_units(), 0);
        assert_eq!(gateway.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        // Arrange
        let gateway = InMemoryOrderGateway::new();
        let mut unit = gateway.begin().await.unwrap();
        let order_id = unit
            .insert_order(&NewOrder {
                order_date: FixedClock::standard().now(),
                header: header(),
            })
            .await
            .unwrap();
        unit.insert_lines(&[line_request(1).for_order(order_id)])
            .await
            .unwrap();

        // Act
        unit.commit().await.unwrap();

        // Assert
        let order = gateway.find_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(gateway.commits(), 1);
        assert_eq!(gateway.open_units(), 0);
    }

    #[tokio::test]
    async fn test_commit_rejects_lines_for_order_deleted_concurrently() {
        // Arrange: one unit adds a line while another deletes the order.
        let gateway = InMemoryOrderGateway::new();
        let seeded = gateway.seed_order(FixedClock::standard().now(), header(), &[]);
        let mut adder = gateway.begin().await.unwrap();
        let mut deleter = gateway.begin().await.unwrap();
        adder
            .insert_lines(&[line_request(2).for_order(seeded.order_id)])
            .await
            .unwrap();
        deleter.delete_order(&seeded.summary()).await.unwrap();
        deleter.commit().await.unwrap();

        // Act
        let result = adder.commit().await;

        // Assert
        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(gateway.line_count(), 0);
        assert_eq!(gateway.open_units(), 0);
    }

    #[tokio::test]
    async fn test_list_orders_applies_offset_and_limit() {
        // Arrange
        let gateway = InMemoryOrderGateway::new();
        for _ in 0..5 {
            gateway.seed_order(FixedClock::standard().now(), header(), &[]);
        }

        // Act
        let page = gateway
            .list_orders(Page::new(Some(1), Some(2)))
            .await
            .unwrap();

        // Assert
        let ids: Vec<i32> = page.iter().map(|order| order.order_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_until_cleared() {
        // Arrange
        let gateway = InMemoryOrderGateway::new();
        gateway.fail_at(FailPoint::Begin);

        // Act
        let failed = gateway.begin().await.is_err();
        gateway.clear_failure();
        let recovered = gateway.begin().await.is_ok();

        // Assert
        assert!(failed);
        assert!(recovered);
    }
}
