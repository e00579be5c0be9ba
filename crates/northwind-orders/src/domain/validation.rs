//! Input rules checked before any store access.

use northwind_core::error::DomainError;
use northwind_core::model::{OrderHeader, OrderLineRequest, Page};
use rust_decimal::Decimal;

/// Longest customer id accepted; Northwind customer keys are five characters.
pub const CUSTOMER_ID_MAX_LEN: usize = 5;

/// Checks the caller-supplied header fields of a new order.
///
/// # Errors
///
/// Returns `DomainError::Validation` naming the first offending field.
pub fn validate_header(header: &OrderHeader) -> Result<(), DomainError> {
    let customer_id = header.customer_id.trim();
    if customer_id.is_empty() {
        return Err(DomainError::validation("customer_id", "must not be blank"));
    }
    if customer_id.chars().count() > CUSTOMER_ID_MAX_LEN {
        return Err(DomainError::validation(
            "customer_id",
            format!("must be at most {CUSTOMER_ID_MAX_LEN} characters, got {customer_id:?}"),
        ));
    }
    match header.freight {
        Some(freight) if freight < Decimal::ZERO => {
            return Err(DomainError::validation(
                "freight",
                format!("must not be negative, got {freight}"),
            ));
        }
        _ => {}
    }
    Ok(())
}

/// Checks every requested line.
///
/// # Errors
///
/// Returns `DomainError::Validation` for the first malformed line; the
/// reason carries the zero-based line index.
pub fn validate_lines(lines: &[OrderLineRequest]) -> Result<(), DomainError> {
    for (index, line) in lines.iter().enumerate() {
        if line.unit_price < Decimal::ZERO {
            return Err(DomainError::validation(
                "unit_price",
                format!("line {index}: must not be negative, got {}", line.unit_price),
            ));
        }
        if line.quantity <= 0 {
            return Err(DomainError::validation(
                "quantity",
                format!("line {index}: must be positive, got {}", line.quantity),
            ));
        }
        if !line.discount.is_finite() || !(0.0..1.0).contains(&line.discount) {
            return Err(DomainError::validation(
                "discount",
                format!("line {index}: must be in [0, 1), got {}", line.discount),
            ));
        }
    }
    Ok(())
}

/// Checks a paging window.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `limit` is zero.
pub fn validate_page(page: Page) -> Result<(), DomainError> {
    if page.limit == Some(0) {
        return Err(DomainError::validation("limit", "must be positive"));
    }
    Ok(())
}
