//! # Storage Capability
//!
//! Per-entity store traits the pipelines are written against, plus the
//! transaction boundary that makes a pipeline's writes all-or-nothing.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storage::begin() ──► Tx                                                │
//! │                        │                                                │
//! │                        ├── ItemStore     read_item, apply_stock_adj.    │
//! │                        ├── RentalStore   read_rental_asset, ...         │
//! │                        ├── CouponStore   read_coupon, increment_usage   │
//! │                        ├── SaleStore     read_sale, insert_sale, ...    │
//! │                        │                                                │
//! │                        ├── commit()  → every write lands                │
//! │                        └── drop      → every write is rolled back       │
//! │                                                                         │
//! │  ReportStore: read-only listings over committed data                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Guards
//! Writes that move a shared counter re-check their floor at write time
//! and fail with the domain error instead of writing:
//! - `apply_stock_adjustment` → `InsufficientStock` if quantity would go
//!   below zero
//! - `apply_rental_adjustment` → `RentalUnavailable` below zero; releases
//!   are capped at the total quantity
//! - `increment_coupon_usage` → `CouponExhausted` once the limit is reached
//!
//! Methods take `&mut self` because a transaction is a single connection
//! used by one pipeline at a time.

use chrono::{DateTime, Utc};
use std::future::Future;

use crate::error::CoreResult;
use crate::money::Money;
use crate::stock::{RentalAdjustment, StockAdjustment};
use crate::types::{Coupon, RentalAsset, RentalCheckout, Sale, SaleReturn, StockItem};

// =============================================================================
// Entity Stores
// =============================================================================

/// Item stock.
pub trait ItemStore {
    /// Reads an item by id, `None` if absent.
    fn read_item(&mut self, item_id: &str) -> impl Future<Output = CoreResult<Option<StockItem>>> + Send;

    /// Applies a signed delta to an item's quantity, refusing to go
    /// negative. `now` stamps the row's `updated_at`.
    fn apply_stock_adjustment(
        &mut self,
        adjustment: &StockAdjustment,
        now: DateTime<Utc>,
    ) -> impl Future<Output = CoreResult<()>> + Send;
}

/// Rental assets, checkouts and the customers table.
pub trait RentalStore {
    fn read_rental_asset(&mut self, rental_id: &str) -> impl Future<Output = CoreResult<Option<RentalAsset>>> + Send;

    /// Checkouts for `phone` not yet returned, oldest first.
    fn read_outstanding_rentals(&mut self, phone: &str) -> impl Future<Output = CoreResult<Vec<RentalCheckout>>> + Send;

    /// Applies a signed delta to available units, keeping
    /// `0 ≤ available ≤ total`.
    fn apply_rental_adjustment(
        &mut self,
        adjustment: &RentalAdjustment,
        now: DateTime<Utc>,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Records the phone as a customer if it is not one already.
    fn ensure_customer(&mut self, phone: &str, now: DateTime<Utc>) -> impl Future<Output = CoreResult<()>> + Send;

    /// Inserts a checkout, returning its assigned id.
    fn insert_rental_checkout(&mut self, checkout: &RentalCheckout) -> impl Future<Output = CoreResult<i64>> + Send;

    /// Marks a checkout returned with its late fee.
    fn mark_rental_returned(
        &mut self,
        checkout_id: i64,
        return_date: DateTime<Utc>,
        late_fee: Money,
    ) -> impl Future<Output = CoreResult<()>> + Send;
}

/// Coupons.
pub trait CouponStore {
    /// Reads a coupon by normalized code.
    fn read_coupon(&mut self, code: &str) -> impl Future<Output = CoreResult<Option<Coupon>>> + Send;

    /// Increments usage by one if the coupon is still active and under its
    /// limit.
    fn increment_coupon_usage(&mut self, code: &str) -> impl Future<Output = CoreResult<()>> + Send;
}

/// Sales, their lines and returns.
pub trait SaleStore {
    /// Reads a sale with its lines in line order.
    fn read_sale(&mut self, sale_id: i64) -> impl Future<Output = CoreResult<Option<Sale>>> + Send;

    /// Inserts the sale and all its lines, returning the sale id.
    fn insert_sale(&mut self, sale: &Sale) -> impl Future<Output = CoreResult<i64>> + Send;

    /// Units of `item_id` already returned against `sale_id`.
    fn returned_quantity(&mut self, sale_id: i64, item_id: &str) -> impl Future<Output = CoreResult<i64>> + Send;

    /// Inserts a return record, returning its id.
    fn insert_return(&mut self, record: &SaleReturn) -> impl Future<Output = CoreResult<i64>> + Send;

    /// Returns recorded against a sale, oldest first.
    fn read_returns(&mut self, sale_id: i64) -> impl Future<Output = CoreResult<Vec<SaleReturn>>> + Send;
}

// =============================================================================
// Transaction Boundary
// =============================================================================

/// An open transaction over every store. Dropping it without calling
/// [`Transaction::commit`] discards all of its writes.
pub trait Transaction: ItemStore + RentalStore + CouponStore + SaleStore + Send {
    fn commit(self) -> impl Future<Output = CoreResult<()>> + Send;
}

/// A storage backend that can open transactions.
pub trait Storage: Send + Sync {
    type Tx: Transaction;

    fn begin(&self) -> impl Future<Output = CoreResult<Self::Tx>> + Send;
}

// =============================================================================
// Reporting
// =============================================================================

/// Read-only listings over committed data, for reports.
pub trait ReportStore: Send + Sync {
    /// Sales (with lines) created in `[from, to)`.
    fn list_sales_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = CoreResult<Vec<Sale>>> + Send;

    /// Returns processed in `[from, to)`.
    fn list_returns_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = CoreResult<Vec<SaleReturn>>> + Send;

    /// All active items.
    fn list_items(&self) -> impl Future<Output = CoreResult<Vec<StockItem>>> + Send;

    /// All rental assets.
    fn list_rental_assets(&self) -> impl Future<Output = CoreResult<Vec<RentalAsset>>> + Send;

    /// Every checkout not yet returned.
    fn list_outstanding_checkouts(&self) -> impl Future<Output = CoreResult<Vec<RentalCheckout>>> + Send;
}
