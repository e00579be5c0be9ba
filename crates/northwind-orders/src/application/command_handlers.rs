//! Command handlers for the order aggregate.
//!
//! Each handler validates its command, opens one unit of work, applies the
//! writes and commits. Any early return drops the unit, which rolls back,
//! so a failed command never leaves part of an aggregate behind.

use northwind_core::clock::Clock;
use northwind_core::command::Command;
use northwind_core::error::DomainError;
use northwind_core::gateway::{OrderGateway, OrderUnitOfWork};
use northwind_core::model::{
    NewOrder, NewOrderLine, Order, OrderDeleted, OrderLine, OrderLineRequest,
};
use tracing::{info, instrument, warn};

use crate::domain::commands::{AddOrderLines, CreateOrder, DeleteOrder};
use crate::domain::validation;

/// Inserts `requests` as lines of `order_id` and returns the persisted lines.
async fn insert_lines(
    unit: &mut dyn OrderUnitOfWork,
    order_id: i32,
    requests: &[OrderLineRequest],
) -> Result<Vec<OrderLine>, DomainError> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }
    let new_lines: Vec<NewOrderLine> = requests
        .iter()
        .map(|request| request.for_order(order_id))
        .collect();
    let line_ids = unit.insert_lines(&new_lines).await?;
    if line_ids.len() != new_lines.len() {
        return Err(DomainError::Store(format!(
            "gateway assigned {} ids for {} lines",
            line_ids.len(),
            new_lines.len()
        )));
    }
    Ok(new_lines
        .into_iter()
        .zip(line_ids)
        .map(|(line, line_id)| line.persisted(line_id))
        .collect())
}

/// Handles the `CreateOrder` command: writes the header and all lines in one
/// unit of work and returns the new aggregate.
///
/// The order date comes from `clock`; every other header field is stored as
/// supplied.
///
/// # Errors
///
/// Returns `DomainError::Validation` for malformed input, before the store
/// is touched. Returns `DomainError::Store` if any write or the commit fails,
/// in which case nothing was persisted.
#[instrument(
    skip_all,
    fields(command_type = command.command_type(), correlation_id = %command.correlation_id)
)]
pub async fn handle_create_order(
    command: &CreateOrder,
    clock: &dyn Clock,
    gateway: &dyn OrderGateway,
) -> Result<Order, DomainError> {
    validation::validate_header(&command.header)?;
    validation::validate_lines(&command.lines)?;

    // Stored ids are the validated, trimmed form.
    let mut header = command.header.clone();
    header.customer_id = header.customer_id.trim().to_owned();
    let new_order = NewOrder {
        order_date: clock.now(),
        header,
    };

    let mut unit = gateway.begin().await?;
    let order_id = unit.insert_order(&new_order).await?;
    let lines = insert_lines(&mut *unit, order_id, &command.lines).await?;
    unit.commit().await?;

    info!(order_id, line_count = lines.len(), "order created");

    Ok(Order {
        order_id,
        order_date: new_order.order_date,
        header: new_order.header,
        lines,
    })
}

/// Handles the `AddOrderLines` command: appends lines to an existing order
/// and returns only the lines that were added.
///
/// # Errors
///
/// Returns `DomainError::Validation` for malformed lines.
/// Returns `DomainError::OrderNotFound` if the order does not exist; nothing
/// is written in that case.
/// Returns `DomainError::Store` if the gateway fails.
#[instrument(
    skip_all,
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        order_id = command.order_id
    )
)]
pub async fn handle_add_order_lines(
    command: &AddOrderLines,
    gateway: &dyn OrderGateway,
) -> Result<Vec<OrderLine>, DomainError> {
    validation::validate_lines(&command.lines)?;

    let mut unit = gateway.begin().await?;
    let Some(order) = unit.find_order(command.order_id).await? else {
        warn!("cannot add lines to missing order");
        return Err(DomainError::OrderNotFound(command.order_id));
    };

    let lines = insert_lines(&mut *unit, order.order_id, &command.lines).await?;
    unit.commit().await?;

    info!(line_count = lines.len(), "order lines added");

    Ok(lines)
}

/// Handles the `DeleteOrder` command: removes every line of the order and
/// then the order itself, in one unit of work.
///
/// # Errors
///
/// Returns `DomainError::OrderNotFound` if the order does not exist.
/// Returns `DomainError::Store` if the gateway fails, in which case the
/// order and all of its lines are left in place.
#[instrument(
    skip_all,
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        order_id = command.order_id
    )
)]
pub async fn handle_delete_order(
    command: &DeleteOrder,
    gateway: &dyn OrderGateway,
) -> Result<OrderDeleted, DomainError> {
    let mut unit = gateway.begin().await?;
    let Some(order) = unit.find_order(command.order_id).await? else {
        warn!("cannot delete missing order");
        return Err(DomainError::OrderNotFound(command.order_id));
    };

    let lines = unit.find_lines(order.order_id).await?;
    let lines_deleted = if lines.is_empty() {
        0
    } else {
        unit.delete_lines(&lines).await?
    };
    unit.delete_order(&order).await?;
    unit.commit().await?;

    info!(lines_deleted, "order deleted");

    Ok(OrderDeleted {
        order_id: order.order_id,
        lines_deleted,
    })
}
