//! Command and query handlers for the order aggregate.

pub mod command_handlers;
pub mod query_handlers;
