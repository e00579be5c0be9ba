//! Northwind Orders: order aggregate manager.
//!
//! Responsible for the order aggregate: validating requests, enforcing that
//! lines never outlive or precede their order, and running every command as
//! a single unit of work against the persistence gateway.

pub mod application;
pub mod domain;
