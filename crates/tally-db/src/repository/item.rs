//! # Item Repository
//!
//! Stock item storage.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock is only ever moved by a signed delta, with the floor checked    │
//! │  in the same statement:                                                 │
//! │                                                                         │
//! │    UPDATE items SET quantity = quantity + :delta                        │
//! │    WHERE item_id = :id AND quantity + :delta >= 0                       │
//! │                                                                         │
//! │  0 rows affected → either the item is gone or the delta would take it  │
//! │  negative. Two concurrent sales of the last unit cannot both pass.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::validation::{validate_identifier, validate_price_cents};
use tally_core::StockItem;

// =============================================================================
// Shared statements (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_item(conn: &mut SqliteConnection, item_id: &str) -> DbResult<Option<StockItem>> {
    let item = sqlx::query_as::<_, StockItem>(
        r#"
        SELECT item_id, name, price_cents, quantity, category, is_active, created_at, updated_at
        FROM items
        WHERE item_id = ?1
        "#,
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Applies a signed delta unless it would take the quantity below zero.
/// Returns `false` when nothing was updated.
pub(crate) async fn apply_quantity_delta(
    conn: &mut SqliteConnection,
    item_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(item_id = %item_id, delta = delta, "Adjusting item stock");

    let result = sqlx::query(
        r#"
        UPDATE items
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE item_id = ?1 AND quantity + ?2 >= 0
        "#,
    )
    .bind(item_id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_active_items(conn: &mut SqliteConnection) -> DbResult<Vec<StockItem>> {
    let items = sqlx::query_as::<_, StockItem>(
        r#"
        SELECT item_id, name, price_cents, quantity, category, is_active, created_at, updated_at
        FROM items
        WHERE is_active = 1
        ORDER BY item_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock item administration.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by id.
    pub async fn get_by_id(&self, item_id: &str) -> DbResult<Option<StockItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, item_id).await
    }

    /// Lists active items ordered by id.
    pub async fn list_active(&self) -> DbResult<Vec<StockItem>> {
        let mut conn = self.pool.acquire().await?;
        list_active_items(&mut conn).await
    }

    /// Inserts a new item.
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(item_id = %item.item_id, "Inserting item");

        validate_identifier("item_id", &item.item_id).map_err(|e| DbError::InvalidData(e.to_string()))?;
        validate_price_cents(item.price_cents).map_err(|e| DbError::InvalidData(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO items (item_id, name, price_cents, quantity, category, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.item_id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(&item.category)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.item_id.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Adjusts stock outside a sale (receiving, shrinkage).
    ///
    /// ## Errors
    /// `NotFound` if the item is missing or the delta would go negative.
    pub async fn adjust_stock(&self, item_id: &str, delta: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        if !apply_quantity_delta(&mut conn, item_id, delta, Utc::now()).await? {
            return Err(DbError::not_found("Item with sufficient stock", item_id));
        }
        Ok(())
    }

    /// Soft-deletes an item; it can no longer be sold.
    pub async fn deactivate(&self, item_id: &str) -> DbResult<()> {
        debug!(item_id = %item_id, "Deactivating item");

        let result = sqlx::query("UPDATE items SET is_active = 0, updated_at = ?2 WHERE item_id = ?1")
            .bind(item_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", item_id));
        }
        Ok(())
    }

    /// Counts all items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
