//! Domain error types.

use thiserror::Error;

/// Top-level error type for order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(i32),

    /// Caller-supplied input is malformed.
    #[error("validation error on `{field}`: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The persistence gateway could not complete the operation.
    #[error("store failure: {0}")]
    Store(String),
}

impl DomainError {
    /// Builds a `Validation` error for `field`.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
