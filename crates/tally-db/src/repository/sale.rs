//! # Sale Repository
//!
//! Sales, their line items and return records.
//!
//! ## Layout
//! ```text
//! sales (1) ──< sale_items (N, ordered by line_no)
//!   │
//!   └───────< sale_returns (N, one per processed return)
//! ```
//!
//! A sale and its lines are written together inside the pipeline's
//! transaction; nothing here commits on its own.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Sale, SaleLineItem, SaleReturn};

const SALE_COLUMNS_SQL: &str = r#"
    SELECT id, employee_id, subtotal_cents, discount_cents, tax_cents, total_cents,
           coupon_code, created_at
    FROM sales
"#;

const RETURN_COLUMNS_SQL: &str = r#"
    SELECT id, sale_id, item_id, item_name, quantity, refund_cents, reason,
           employee_id, returned_at
    FROM sale_returns
"#;

// =============================================================================
// Shared statements (pool or transaction)
// =============================================================================

/// Reads a sale header and its lines.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Option<Sale>> {
    let sql = format!("{SALE_COLUMNS_SQL} WHERE id = ?1");
    let Some(mut sale) = sqlx::query_as::<_, Sale>(&sql)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    sale.lines = sqlx::query_as::<_, SaleLineItem>(
        r#"
        SELECT sale_id, item_id, item_name, quantity, unit_price_cents, line_total_cents
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(sale))
}

/// Inserts the header, then every line in order. Returns the new sale id.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales
            (employee_id, subtotal_cents, discount_cents, tax_cents, total_cents, coupon_code, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.employee_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(&sale.coupon_code)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    let sale_id = result.last_insert_rowid();

    for (line_no, line) in sale.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items
                (sale_id, line_no, item_id, item_name, quantity, unit_price_cents, line_total_cents)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sale_id)
        .bind(line_no as i64)
        .bind(&line.item_id)
        .bind(&line.item_name)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;
    }

    debug!(sale_id = sale_id, lines = sale.lines.len(), "Sale inserted");
    Ok(sale_id)
}

/// Units of an item already returned against a sale.
pub(crate) async fn returned_quantity(conn: &mut SqliteConnection, sale_id: i64, item_id: &str) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM sale_returns WHERE sale_id = ?1 AND item_id = ?2",
    )
    .bind(sale_id)
    .bind(item_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total)
}

pub(crate) async fn insert_return(conn: &mut SqliteConnection, record: &SaleReturn) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_returns
            (sale_id, item_id, item_name, quantity, refund_cents, reason, employee_id, returned_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(record.sale_id)
    .bind(&record.item_id)
    .bind(&record.item_name)
    .bind(record.quantity)
    .bind(record.refund_cents)
    .bind(&record.reason)
    .bind(&record.employee_id)
    .bind(record.returned_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(crate) async fn fetch_returns(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Vec<SaleReturn>> {
    let sql = format!("{RETURN_COLUMNS_SQL} WHERE sale_id = ?1 ORDER BY returned_at, id");
    let rows = sqlx::query_as::<_, SaleReturn>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Sales created in `[from, to)`, each with its lines.
pub(crate) async fn list_sales_between(
    conn: &mut SqliteConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Vec<Sale>> {
    let sql = format!("{SALE_COLUMNS_SQL} WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at, id");
    let mut sales = sqlx::query_as::<_, Sale>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

    let lines = sqlx::query_as::<_, SaleLineItem>(
        r#"
        SELECT si.sale_id, si.item_id, si.item_name, si.quantity, si.unit_price_cents, si.line_total_cents
        FROM sale_items si
        JOIN sales s ON s.id = si.sale_id
        WHERE s.created_at >= ?1 AND s.created_at < ?2
        ORDER BY si.sale_id, si.line_no
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_sale: HashMap<i64, Vec<SaleLineItem>> = HashMap::new();
    for line in lines {
        by_sale.entry(line.sale_id).or_default().push(line);
    }
    for sale in &mut sales {
        sale.lines = by_sale.remove(&sale.id).unwrap_or_default();
    }

    Ok(sales)
}

/// Returns processed in `[from, to)`.
pub(crate) async fn list_returns_between(
    conn: &mut SqliteConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Vec<SaleReturn>> {
    let sql = format!("{RETURN_COLUMNS_SQL} WHERE returned_at >= ?1 AND returned_at < ?2 ORDER BY returned_at, id");
    let rows = sqlx::query_as::<_, SaleReturn>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

// =============================================================================
// Repository
// =============================================================================

/// Read access to recorded sales outside a pipeline.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines.
    pub async fn get_by_id(&self, sale_id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, sale_id).await
    }

    /// Returns recorded against a sale.
    pub async fn returns_for(&self, sale_id: i64) -> DbResult<Vec<SaleReturn>> {
        let mut conn = self.pool.acquire().await?;
        fetch_returns(&mut conn, sale_id).await
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
