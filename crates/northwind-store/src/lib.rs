//! Northwind Store: PostgreSQL persistence for orders.

pub mod pg_order_gateway;

pub use pg_order_gateway::PgOrderGateway;

/// Schema migrations for the `orders` and `order_lines` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
