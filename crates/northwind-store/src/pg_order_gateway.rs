//! `PostgreSQL` implementation of the `OrderGateway` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use northwind_core::error::DomainError;
use northwind_core::gateway::{OrderGateway, OrderUnitOfWork};
use northwind_core::model::{
    NewOrder, NewOrderLine, Order, OrderHeader, OrderLine, OrderSummary, Page,
};

const SELECT_ORDERS_PAGE: &str = r"
SELECT order_id, customer_id, employee_id, order_date, required_date, ship_via, freight,
       ship_name, ship_address, ship_city, ship_region, ship_postal_code, ship_country
FROM orders
ORDER BY order_id
OFFSET $1
LIMIT $2
";

const SELECT_ORDER: &str = r"
SELECT order_id, customer_id, employee_id, order_date, required_date, ship_via, freight,
       ship_name, ship_address, ship_city, ship_region, ship_postal_code, ship_country
FROM orders
WHERE order_id = $1
";

const SELECT_ORDER_FOR_UPDATE: &str = r"
SELECT order_id, customer_id, employee_id, order_date, required_date, ship_via, freight,
       ship_name, ship_address, ship_city, ship_region, ship_postal_code, ship_country
FROM orders
WHERE order_id = $1
FOR UPDATE
";

const SELECT_LINES: &str = r"
SELECT order_line_id, order_id, product_id, unit_price, quantity, discount
FROM order_lines
WHERE order_id = $1
ORDER BY order_line_id
";

const INSERT_ORDER: &str = r"
INSERT INTO orders (
    customer_id, employee_id, order_date, required_date, ship_via, freight,
    ship_name, ship_address, ship_city, ship_region, ship_postal_code, ship_country
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
RETURNING order_id
";

const INSERT_LINE: &str = r"
INSERT INTO order_lines (order_id, product_id, unit_price, quantity, discount)
VALUES ($1, $2, $3, $4, $5)
RETURNING order_line_id
";

const DELETE_LINES: &str = "DELETE FROM order_lines WHERE order_line_id = ANY($1)";

const DELETE_ORDER: &str = "DELETE FROM orders WHERE order_id = $1";

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> DomainError {
    DomainError::Store(format!("{operation}: {err}"))
}

#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: i32,
    customer_id: String,
    employee_id: Option<i32>,
    order_date: DateTime<Utc>,
    required_date: Option<DateTime<Utc>>,
    ship_via: Option<i32>,
    freight: Option<Decimal>,
    ship_name: Option<String>,
    ship_address: Option<String>,
    ship_city: Option<String>,
    ship_region: Option<String>,
    ship_postal_code: Option<String>,
    ship_country: Option<String>,
}

impl From<OrderRow> for OrderSummary {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            order_date: row.order_date,
            header: OrderHeader {
                customer_id: row.customer_id,
                employee_id: row.employee_id,
                required_date: row.required_date,
                ship_via: row.ship_via,
                freight: row.freight,
                ship_name: row.ship_name,
                ship_address: row.ship_address,
                ship_city: row.ship_city,
                ship_region: row.ship_region,
                ship_postal_code: row.ship_postal_code,
                ship_country: row.ship_country,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    order_line_id: i32,
    order_id: i32,
    product_id: i32,
    unit_price: Decimal,
    quantity: i32,
    discount: f32,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            line_id: row.order_line_id,
            order_id: row.order_id,
            product_id: row.product_id,
            unit_price: row.unit_price,
            quantity: row.quantity,
            discount: row.discount,
        }
    }
}

async fn select_order(
    conn: &mut PgConnection,
    sql: &'static str,
    order_id: i32,
) -> Result<Option<OrderSummary>, DomainError> {
    let row = sqlx::query_as::<_, OrderRow>(sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("select_order", e))?;
    Ok(row.map(OrderSummary::from))
}

async fn select_lines(
    conn: &mut PgConnection,
    order_id: i32,
) -> Result<Vec<OrderLine>, DomainError> {
    let rows = sqlx::query_as::<_, OrderLineRow>(SELECT_LINES)
        .bind(order_id)
        .fetch_all(conn)
        .await
        .map_err(|e| map_sqlx_error("select_lines", e))?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
}

/// PostgreSQL-backed order gateway.
#[derive(Debug, Clone)]
pub struct PgOrderGateway {
    pool: PgPool,
}

impl PgOrderGateway {
    /// Creates a new `PgOrderGateway`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderGateway for PgOrderGateway {
    #[instrument(skip(self))]
    async fn list_orders(&self, page: Page) -> Result<Vec<OrderSummary>, DomainError> {
        let rows = sqlx::query_as::<_, OrderRow>(SELECT_ORDERS_PAGE)
            .bind(i64::from(page.offset.unwrap_or(0)))
            .bind(page.limit.map(i64::from))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_order(&self, order_id: i32) -> Result<Option<Order>, DomainError> {
        // Header and lines must come from the same snapshot.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let order = match select_order(&mut tx, SELECT_ORDER, order_id).await? {
            Some(summary) => {
                let lines = select_lines(&mut tx, order_id).await?;
                Some(Order::from_parts(summary, lines))
            }
            None => None,
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))?;
        select_lines(&mut conn, order_id).await
    }

    async fn begin(&self) -> Result<Box<dyn OrderUnitOfWork>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgOrderUnitOfWork { tx }))
    }
}

/// A unit of work backed by one database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
struct PgOrderUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderUnitOfWork for PgOrderUnitOfWork {
    async fn find_order(&mut self, order_id: i32) -> Result<Option<OrderSummary>, DomainError> {
        select_order(&mut self.tx, SELECT_ORDER_FOR_UPDATE, order_id).await
    }

    async fn find_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        select_lines(&mut self.tx, order_id).await
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<i32, DomainError> {
        let header = &order.header;
        let order_id = sqlx::query_scalar::<_, i32>(INSERT_ORDER)
            .bind(&header.customer_id)
            .bind(header.employee_id)
            .bind(order.order_date)
            .bind(header.required_date)
            .bind(header.ship_via)
            .bind(header.freight)
            .bind(header.ship_name.as_deref())
            .bind(header.ship_address.as_deref())
            .bind(header.ship_city.as_deref())
            .bind(header.ship_region.as_deref())
            .bind(header.ship_postal_code.as_deref())
            .bind(header.ship_country.as_deref())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        debug!(order_id, "inserted order header");
        Ok(order_id)
    }

    async fn insert_lines(&mut self, lines: &[NewOrderLine]) -> Result<Vec<i32>, DomainError> {
        let mut line_ids = Vec::with_capacity(lines.len());
        for line in lines {
            let line_id = sqlx::query_scalar::<_, i32>(INSERT_LINE)
                .bind(line.order_id)
                .bind(line.product_id)
                .bind(line.unit_price)
                .bind(line.quantity)
                .bind(line.discount)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("insert_line", e))?;
            line_ids.push(line_id);
        }
        debug!(count = line_ids.len(), "inserted order lines");
        Ok(line_ids)
    }

    async fn delete_lines(&mut self, lines: &[OrderLine]) -> Result<u64, DomainError> {
        let line_ids: Vec<i32> = lines.iter().map(|line| line.line_id).collect();
        let result = sqlx::query(DELETE_LINES)
            .bind(&line_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_lines", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&mut self, order: &OrderSummary) -> Result<(), DomainError> {
        let result = sqlx::query(DELETE_ORDER)
            .bind(order.order_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::OrderNotFound(order.order_id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback_transaction", e))
    }
}
