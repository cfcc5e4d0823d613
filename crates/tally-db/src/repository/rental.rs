//! # Rental Repository
//!
//! Rental assets, customers and rental checkouts.
//!
//! ## Availability Updates
//! ```text
//! reserve:  available = MIN(total, available + (-qty))  WHERE available - qty >= 0
//! release:  available = MIN(total, available + qty)     (capped at total)
//! ```
//! A single statement handles both directions: the WHERE clause is the
//! floor, `MIN(total_quantity, ...)` is the ceiling.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::validation::{validate_identifier, validate_price_cents};
use tally_core::{RentalAsset, RentalCheckout};

// =============================================================================
// Shared statements (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_rental_asset(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<Option<RentalAsset>> {
    let asset = sqlx::query_as::<_, RentalAsset>(
        r#"
        SELECT rental_id, name, price_per_day_cents, total_quantity, available_quantity,
               category, is_active, created_at, updated_at
        FROM rentals
        WHERE rental_id = ?1
        "#,
    )
    .bind(rental_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(asset)
}

pub(crate) async fn list_rental_assets(conn: &mut SqliteConnection) -> DbResult<Vec<RentalAsset>> {
    let assets = sqlx::query_as::<_, RentalAsset>(
        r#"
        SELECT rental_id, name, price_per_day_cents, total_quantity, available_quantity,
               category, is_active, created_at, updated_at
        FROM rentals
        ORDER BY rental_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(assets)
}

/// Applies a signed delta to available units within `[0, total]`.
/// Returns `false` when the floor would be crossed (or the asset is gone).
pub(crate) async fn apply_availability_delta(
    conn: &mut SqliteConnection,
    rental_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(rental_id = %rental_id, delta = delta, "Adjusting rental availability");

    let result = sqlx::query(
        r#"
        UPDATE rentals
        SET available_quantity = MIN(total_quantity, available_quantity + ?2), updated_at = ?3
        WHERE rental_id = ?1 AND available_quantity + ?2 >= 0
        "#,
    )
    .bind(rental_id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn ensure_customer(conn: &mut SqliteConnection, phone: &str, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query("INSERT OR IGNORE INTO customers (phone_number, created_at) VALUES (?1, ?2)")
        .bind(phone)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() > 0 {
        debug!(phone = %phone, "Registered walk-up customer");
    }
    Ok(())
}

pub(crate) async fn insert_checkout(conn: &mut SqliteConnection, checkout: &RentalCheckout) -> DbResult<i64> {
    debug!(phone = %checkout.customer_phone, rental_id = %checkout.rental_id, "Inserting rental checkout");

    let result = sqlx::query(
        r#"
        INSERT INTO rental_checkouts
            (customer_phone, rental_id, quantity, rental_date, due_date, return_date, is_returned, late_fee_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&checkout.customer_phone)
    .bind(&checkout.rental_id)
    .bind(checkout.quantity)
    .bind(checkout.rental_date)
    .bind(checkout.due_date)
    .bind(checkout.return_date)
    .bind(checkout.is_returned)
    .bind(checkout.late_fee_cents)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

const CHECKOUT_COLUMNS_SQL: &str = r#"
    SELECT id, customer_phone, rental_id, quantity, rental_date, due_date,
           return_date, is_returned, late_fee_cents
    FROM rental_checkouts
"#;

pub(crate) async fn fetch_outstanding(conn: &mut SqliteConnection, phone: &str) -> DbResult<Vec<RentalCheckout>> {
    let sql = format!("{CHECKOUT_COLUMNS_SQL} WHERE customer_phone = ?1 AND is_returned = 0 ORDER BY rental_date, id");
    let rows = sqlx::query_as::<_, RentalCheckout>(&sql)
        .bind(phone)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

pub(crate) async fn fetch_all_outstanding(conn: &mut SqliteConnection) -> DbResult<Vec<RentalCheckout>> {
    let sql = format!("{CHECKOUT_COLUMNS_SQL} WHERE is_returned = 0 ORDER BY due_date, id");
    let rows = sqlx::query_as::<_, RentalCheckout>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Marks an outstanding checkout returned. Returns `false` if it was not
/// outstanding.
pub(crate) async fn mark_returned(
    conn: &mut SqliteConnection,
    checkout_id: i64,
    return_date: DateTime<Utc>,
    late_fee_cents: i64,
) -> DbResult<bool> {
    debug!(checkout_id = checkout_id, late_fee_cents = late_fee_cents, "Marking rental returned");

    let result = sqlx::query(
        r#"
        UPDATE rental_checkouts
        SET is_returned = 1, return_date = ?2, late_fee_cents = ?3
        WHERE id = ?1 AND is_returned = 0
        "#,
    )
    .bind(checkout_id)
    .bind(return_date)
    .bind(late_fee_cents)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for rental asset administration and checkout history.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    /// Gets a rental asset by id.
    pub async fn get_by_id(&self, rental_id: &str) -> DbResult<Option<RentalAsset>> {
        let mut conn = self.pool.acquire().await?;
        fetch_rental_asset(&mut conn, rental_id).await
    }

    /// Lists all rental assets.
    pub async fn list(&self) -> DbResult<Vec<RentalAsset>> {
        let mut conn = self.pool.acquire().await?;
        list_rental_assets(&mut conn).await
    }

    /// Inserts a new rental asset.
    pub async fn insert(&self, asset: &RentalAsset) -> DbResult<()> {
        debug!(rental_id = %asset.rental_id, "Inserting rental asset");

        validate_identifier("rental_id", &asset.rental_id).map_err(|e| DbError::InvalidData(e.to_string()))?;
        validate_price_cents(asset.price_per_day_cents).map_err(|e| DbError::InvalidData(e.to_string()))?;
        if asset.available_quantity < 0 || asset.available_quantity > asset.total_quantity {
            return Err(DbError::InvalidData(format!(
                "available quantity {} must be within 0..={}",
                asset.available_quantity, asset.total_quantity
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO rentals
                (rental_id, name, price_per_day_cents, total_quantity, available_quantity,
                 category, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&asset.rental_id)
        .bind(&asset.name)
        .bind(asset.price_per_day_cents)
        .bind(asset.total_quantity)
        .bind(asset.available_quantity)
        .bind(&asset.category)
        .bind(asset.is_active)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, asset.rental_id.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Full checkout history for a customer, newest first.
    pub async fn history_for(&self, phone: &str) -> DbResult<Vec<RentalCheckout>> {
        let sql = format!("{CHECKOUT_COLUMNS_SQL} WHERE customer_phone = ?1 ORDER BY rental_date DESC, id DESC");
        let rows = sqlx::query_as::<_, RentalCheckout>(&sql)
            .bind(phone)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Whether the phone has been seen as a customer.
    pub async fn customer_exists(&self, phone: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE phone_number = ?1")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_asset;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_rejects_available_over_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut asset = sample_asset("2001", 5000, 5);
        asset.available_quantity = 6;
        assert!(matches!(db.rentals().insert(&asset).await, Err(DbError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_availability_delta_floor_and_cap() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rentals().insert(&sample_asset("2001", 5000, 2)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(apply_availability_delta(&mut conn, "2001", -2, Utc::now()).await.unwrap());
        assert!(!apply_availability_delta(&mut conn, "2001", -1, Utc::now()).await.unwrap());
        // Release more than was taken: capped at total
        assert!(apply_availability_delta(&mut conn, "2001", 5, Utc::now()).await.unwrap());
        let asset = fetch_rental_asset(&mut conn, "2001").await.unwrap().unwrap();
        assert_eq!(asset.available_quantity, 2);
        assert!(!apply_availability_delta(&mut conn, "9999", 1, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_checkout_roundtrip_and_walk_up_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rentals().insert(&sample_asset("2001", 5000, 2)).await.unwrap();
        let now = Utc::now();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            ensure_customer(&mut conn, "5551234567", now).await.unwrap();
            ensure_customer(&mut conn, "5551234567", now).await.unwrap();

            let checkout = RentalCheckout {
                id: 0,
                customer_phone: "5551234567".to_string(),
                rental_id: "2001".to_string(),
                quantity: 1,
                rental_date: now,
                due_date: now + chrono::Duration::days(14),
                return_date: None,
                is_returned: false,
                late_fee_cents: 0,
            };
            let id = insert_checkout(&mut conn, &checkout).await.unwrap();
            assert!(id > 0);

            let outstanding = fetch_outstanding(&mut conn, "5551234567").await.unwrap();
            assert_eq!(outstanding.len(), 1);

            assert!(mark_returned(&mut conn, id, now, 0).await.unwrap());
            assert!(!mark_returned(&mut conn, id, now, 0).await.unwrap());
            assert!(fetch_outstanding(&mut conn, "5551234567").await.unwrap().is_empty());
        }

        assert!(db.rentals().customer_exists("5551234567").await.unwrap());
        let history = db.rentals().history_for("5551234567").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_returned);
    }

    #[tokio::test]
    async fn test_checkout_requires_customer_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rentals().insert(&sample_asset("2001", 5000, 2)).await.unwrap();
        let now = Utc::now();

        let mut conn = db.pool().acquire().await.unwrap();
        let checkout = RentalCheckout {
            id: 0,
            customer_phone: "5550000000".to_string(),
            rental_id: "2001".to_string(),
            quantity: 1,
            rental_date: now,
            due_date: now,
            return_date: None,
            is_returned: false,
            late_fee_cents: 0,
        };
        let err = insert_checkout(&mut conn, &checkout).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
