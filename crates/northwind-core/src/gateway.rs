//! Persistence gateway abstraction.
//!
//! The order manager talks to storage only through these two traits. Reads
//! that need no write isolation go straight through [`OrderGateway`]; every
//! command runs inside one [`OrderUnitOfWork`] obtained from
//! [`OrderGateway::begin`].

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{NewOrder, NewOrderLine, Order, OrderLine, OrderSummary, Page};

/// Record-level access to orders and their lines.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Lists order headers in ascending order id, windowed by `page`.
    async fn list_orders(&self, page: Page) -> Result<Vec<OrderSummary>, DomainError>;

    /// Loads an order and its lines from a single consistent snapshot.
    async fn find_order(&self, order_id: i32) -> Result<Option<Order>, DomainError>;

    /// Loads the lines owned by `order_id`, ordered by line id.
    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderLine>, DomainError>;

    /// Opens a unit of work.
    ///
    /// Writes made through the returned handle become visible to other
    /// readers only once [`OrderUnitOfWork::commit`] succeeds. Dropping the
    /// handle without committing rolls all of them back.
    async fn begin(&self) -> Result<Box<dyn OrderUnitOfWork>, DomainError>;
}

/// An all-or-nothing set of reads and writes.
#[async_trait]
pub trait OrderUnitOfWork: Send {
    /// Looks up an order header. Implementations that support row locks hold
    /// one on the header until the unit ends.
    async fn find_order(&mut self, order_id: i32) -> Result<Option<OrderSummary>, DomainError>;

    /// Loads the lines owned by `order_id`, ordered by line id.
    async fn find_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError>;

    /// Inserts an order header and returns its assigned id.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<i32, DomainError>;

    /// Inserts lines and returns their assigned ids, one per input in order.
    async fn insert_lines(&mut self, lines: &[NewOrderLine]) -> Result<Vec<i32>, DomainError>;

    /// Deletes the given lines and returns how many rows were removed.
    async fn delete_lines(&mut self, lines: &[OrderLine]) -> Result<u64, DomainError>;

    /// Deletes an order header.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OrderNotFound` if the header no longer exists.
    async fn delete_order(&mut self, order: &OrderSummary) -> Result<(), DomainError>;

    /// Makes every write in this unit visible.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discards every write in this unit.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
