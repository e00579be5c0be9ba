//! Command abstractions.

use uuid::Uuid;

/// Trait that all order commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The existing order this command targets, if any.
    ///
    /// `None` for commands that create a new order.
    fn target_order_id(&self) -> Option<i32>;
}
