//! # SQLite Storage
//!
//! Implements the core storage capability on top of sqlx transactions.
//!
//! ## Transaction Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::begin()                                                      │
//! │       │   BEGIN IMMEDIATE (one pooled connection, write lock taken     │
//! │       │   up front, held until commit/drop)                            │
//! │       ▼                                                                 │
//! │  SqliteTransaction                                                      │
//! │       │   reads + guarded writes via the repository statements         │
//! │       │                                                                 │
//! │       ├── commit()  → COMMIT                                            │
//! │       └── drop      → ROLLBACK (sqlx rolls back unfinished tx on drop) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every pipeline reads before it writes, so the write lock is taken at
//! BEGIN. A competing writer waits out `busy_timeout` there; a deferred
//! reader-to-writer upgrade would fail with `SQLITE_BUSY` instead.
//!
//! A guarded write that touches zero rows is turned back into the domain
//! error by re-reading the row, so the caller sees `InsufficientStock`
//! with the quantity that was actually there at write time.

use chrono::{DateTime, Utc};
use sqlx::Sqlite;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{coupon, item, rental, sale};
use tally_core::stock::{RentalAdjustment, StockAdjustment};
use tally_core::store::{CouponStore, ItemStore, RentalStore, ReportStore, SaleStore, Storage, Transaction};
use tally_core::{
    Coupon, CoreError, CoreResult, Money, RentalAsset, RentalCheckout, Sale, SaleReturn, StockItem,
};

/// An open SQLite transaction. Rolled back if dropped uncommitted.
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction").finish_non_exhaustive()
    }
}

// =============================================================================
// Storage / ReportStore for Database
// =============================================================================

impl Storage for Database {
    type Tx = SqliteTransaction;

    async fn begin(&self) -> CoreResult<SqliteTransaction> {
        let tx = self
            .pool()
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(SqliteTransaction { tx })
    }
}

impl ReportStore for Database {
    async fn list_sales_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> CoreResult<Vec<Sale>> {
        let mut conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(sale::list_sales_between(&mut conn, from, to).await?)
    }

    async fn list_returns_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> CoreResult<Vec<SaleReturn>> {
        let mut conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(sale::list_returns_between(&mut conn, from, to).await?)
    }

    async fn list_items(&self) -> CoreResult<Vec<StockItem>> {
        let mut conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(item::list_active_items(&mut conn).await?)
    }

    async fn list_rental_assets(&self) -> CoreResult<Vec<RentalAsset>> {
        let mut conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(rental::list_rental_assets(&mut conn).await?)
    }

    async fn list_outstanding_checkouts(&self) -> CoreResult<Vec<RentalCheckout>> {
        let mut conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(rental::fetch_all_outstanding(&mut conn).await?)
    }
}

// =============================================================================
// Entity stores
// =============================================================================

impl ItemStore for SqliteTransaction {
    async fn read_item(&mut self, item_id: &str) -> CoreResult<Option<StockItem>> {
        Ok(item::fetch_item(&mut self.tx, item_id).await?)
    }

    async fn apply_stock_adjustment(&mut self, adjustment: &StockAdjustment, now: DateTime<Utc>) -> CoreResult<()> {
        if item::apply_quantity_delta(&mut self.tx, &adjustment.item_id, adjustment.delta, now).await? {
            return Ok(());
        }

        match item::fetch_item(&mut self.tx, &adjustment.item_id).await? {
            None => Err(CoreError::ItemNotFound(adjustment.item_id.clone())),
            Some(current) => {
                warn!(
                    item_id = %current.item_id,
                    on_hand = current.quantity,
                    delta = adjustment.delta,
                    "Stock guard rejected adjustment"
                );
                Err(CoreError::InsufficientStock {
                    item_id: current.item_id,
                    available: current.quantity,
                    requested: -adjustment.delta,
                })
            }
        }
    }
}

impl RentalStore for SqliteTransaction {
    async fn read_rental_asset(&mut self, rental_id: &str) -> CoreResult<Option<RentalAsset>> {
        Ok(rental::fetch_rental_asset(&mut self.tx, rental_id).await?)
    }

    async fn read_outstanding_rentals(&mut self, phone: &str) -> CoreResult<Vec<RentalCheckout>> {
        Ok(rental::fetch_outstanding(&mut self.tx, phone).await?)
    }

    async fn apply_rental_adjustment(&mut self, adjustment: &RentalAdjustment, now: DateTime<Utc>) -> CoreResult<()> {
        if rental::apply_availability_delta(&mut self.tx, &adjustment.rental_id, adjustment.delta, now).await? {
            return Ok(());
        }

        match rental::fetch_rental_asset(&mut self.tx, &adjustment.rental_id).await? {
            None => Err(CoreError::RentalNotFound(adjustment.rental_id.clone())),
            Some(current) => {
                warn!(
                    rental_id = %current.rental_id,
                    available = current.available_quantity,
                    delta = adjustment.delta,
                    "Availability guard rejected adjustment"
                );
                Err(CoreError::RentalUnavailable {
                    rental_id: current.rental_id,
                    available: current.available_quantity,
                    requested: -adjustment.delta,
                })
            }
        }
    }

    async fn ensure_customer(&mut self, phone: &str, now: DateTime<Utc>) -> CoreResult<()> {
        Ok(rental::ensure_customer(&mut self.tx, phone, now).await?)
    }

    async fn insert_rental_checkout(&mut self, checkout: &RentalCheckout) -> CoreResult<i64> {
        Ok(rental::insert_checkout(&mut self.tx, checkout).await?)
    }

    async fn mark_rental_returned(
        &mut self,
        checkout_id: i64,
        return_date: DateTime<Utc>,
        late_fee: Money,
    ) -> CoreResult<()> {
        if rental::mark_returned(&mut self.tx, checkout_id, return_date, late_fee.cents()).await? {
            Ok(())
        } else {
            Err(DbError::not_found("Outstanding rental checkout", checkout_id.to_string()).into())
        }
    }
}

impl CouponStore for SqliteTransaction {
    async fn read_coupon(&mut self, code: &str) -> CoreResult<Option<Coupon>> {
        Ok(coupon::fetch_coupon(&mut self.tx, code).await?)
    }

    async fn increment_coupon_usage(&mut self, code: &str) -> CoreResult<()> {
        if coupon::increment_usage(&mut self.tx, code).await? {
            Ok(())
        } else {
            warn!(code = %code, "Coupon usage guard rejected increment");
            Err(CoreError::CouponExhausted(code.to_string()))
        }
    }
}

impl SaleStore for SqliteTransaction {
    async fn read_sale(&mut self, sale_id: i64) -> CoreResult<Option<Sale>> {
        Ok(sale::fetch_sale(&mut self.tx, sale_id).await?)
    }

    async fn insert_sale(&mut self, record: &Sale) -> CoreResult<i64> {
        Ok(sale::insert_sale(&mut self.tx, record).await?)
    }

    async fn returned_quantity(&mut self, sale_id: i64, item_id: &str) -> CoreResult<i64> {
        Ok(sale::returned_quantity(&mut self.tx, sale_id, item_id).await?)
    }

    async fn insert_return(&mut self, record: &SaleReturn) -> CoreResult<i64> {
        Ok(sale::insert_return(&mut self.tx, record).await?)
    }

    async fn read_returns(&mut self, sale_id: i64) -> CoreResult<Vec<SaleReturn>> {
        Ok(sale::fetch_returns(&mut self.tx, sale_id).await?)
    }
}

impl Transaction for SqliteTransaction {
    async fn commit(self) -> CoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_asset, sample_coupon, sample_item};
    use crate::pool::DbConfig;
    use tally_core::stock::{release_rental_units, reserve};
    use chrono::TimeZone;
    use tally_core::DiscountKind;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    async fn db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&sample_item("1001", 1000, 3)).await.unwrap();
        db.rentals().insert(&sample_asset("2001", 5000, 2)).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = db().await;
        {
            let mut tx = db.begin().await.unwrap();
            let item = tx.read_item("1001").await.unwrap().unwrap();
            tx.apply_stock_adjustment(&reserve(&item, 2).unwrap(), stamp()).await.unwrap();
            // dropped without commit
        }
        assert_eq!(db.items().get_by_id("1001").await.unwrap().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_commit_persists() {
        let db = db().await;
        let mut tx = db.begin().await.unwrap();
        let item = tx.read_item("1001").await.unwrap().unwrap();
        tx.apply_stock_adjustment(&reserve(&item, 2).unwrap(), stamp()).await.unwrap();
        tx.commit().await.unwrap();

        let stored = db.items().get_by_id("1001").await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.updated_at, stamp());
    }

    #[tokio::test]
    async fn test_stale_reservation_reports_current_stock() {
        let db = db().await;
        let mut tx = db.begin().await.unwrap();
        let item = tx.read_item("1001").await.unwrap().unwrap();
        let adjustment = reserve(&item, 3).unwrap();
        // Someone else took a unit between read and write
        tx.apply_stock_adjustment(&StockAdjustment { item_id: "1001".into(), delta: -1 }, stamp())
            .await
            .unwrap();

        let err = tx.apply_stock_adjustment(&adjustment, stamp()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));

        let missing = tx
            .apply_stock_adjustment(&StockAdjustment { item_id: "9999".into(), delta: -1 }, stamp())
            .await
            .unwrap_err();
        assert!(matches!(missing, CoreError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_rental_release_is_capped() {
        let db = db().await;
        let mut tx = db.begin().await.unwrap();
        let asset = tx.read_rental_asset("2001").await.unwrap().unwrap();
        let (adjustment, dropped) = release_rental_units(&asset, 1);
        assert_eq!(adjustment.delta, 0);
        assert_eq!(dropped, 1);
        tx.apply_rental_adjustment(&adjustment, stamp()).await.unwrap();

        let err = tx
            .apply_rental_adjustment(&RentalAdjustment { rental_id: "2001".into(), delta: -3 }, stamp())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RentalUnavailable { available: 2, requested: 3, .. }));
        tx.commit().await.unwrap();

        let asset = db.rentals().get_by_id("2001").await.unwrap().unwrap();
        assert_eq!(asset.available_quantity, 2);
    }

    #[tokio::test]
    async fn test_coupon_increment_guard() {
        let db = db().await;
        let mut coupon = sample_coupon("ONCE", DiscountKind::Fixed, 500);
        coupon.usage_limit = 1;
        db.coupons().insert(&coupon).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        tx.increment_coupon_usage("ONCE").await.unwrap();
        let err = tx.increment_coupon_usage("ONCE").await.unwrap_err();
        assert!(matches!(err, CoreError::CouponExhausted(code) if code == "ONCE"));
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_report_store_reads_committed_state() {
        let db = db().await;
        assert_eq!(db.list_items().await.unwrap().len(), 1);
        assert_eq!(db.list_rental_assets().await.unwrap().len(), 1);
        assert!(db.list_outstanding_checkouts().await.unwrap().is_empty());
    }
}
