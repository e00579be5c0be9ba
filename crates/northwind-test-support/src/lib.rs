//! Shared test gateways and utilities for Northwind Orders.

mod clock;
mod gateway;

pub use clock::FixedClock;
pub use gateway::{FailPoint, FailingOrderGateway, InMemoryOrderGateway};
