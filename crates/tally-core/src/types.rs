//! # Domain Types
//!
//! Core domain types used throughout the back office.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Administered (read by pipelines)      Created by pipelines             │
//! │  ─────────────────────────────────     ──────────────────────────────   │
//! │  StockItem    id "1001", price, qty    Sale ──┬── SaleLineItem (1..n)   │
//! │  RentalAsset  id "2001", price/day,    │      └── SaleReturn (0..n)     │
//! │               total, available         │                                │
//! │  Coupon       code, kind, value,       RentalCheckout (per phone)       │
//! │               limit, usage             │                                │
//! │  Employee     id, role, hash           Receipts (returned, not stored)  │
//! │                                                                         │
//! │  Rate: basis points (800 = 8%) for tax, late fee, percentage coupons   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `_cents: i64` with typed [`Money`]
//! accessors, so rows map one-to-one onto database columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 800 bps = 8% tax, 1000 bps = 10% late fee or coupon
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from whole percent (10 → 10%).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Rate(percent * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// A rate of zero.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Parses a decimal fraction such as `"0.08"` (8%) without going
    /// through floating point.
    ///
    /// At most four fractional digits are accepted (one basis point).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::types::Rate;
    ///
    /// assert_eq!(Rate::parse_fraction("0.08").unwrap().bps(), 800);
    /// assert_eq!(Rate::parse_fraction("0.0825").unwrap().bps(), 825);
    /// assert_eq!(Rate::parse_fraction("1").unwrap().bps(), 10000);
    /// assert!(Rate::parse_fraction("0.12345").is_err());
    /// ```
    pub fn parse_fraction(input: &str) -> Result<Rate, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "rate".to_string(),
            reason: reason.to_string(),
        };

        let input = input.trim();
        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a decimal fraction such as 0.08"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal fraction such as 0.08"));
        }
        if frac.len() > 4 {
            return Err(invalid("at most four decimal places are supported"));
        }

        let whole: u32 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("value is too large"))?
        };
        let frac_bps: u32 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<4}", frac);
            padded.parse().map_err(|_| invalid("invalid fractional part"))?
        };

        if whole > 1 || (whole == 1 && frac_bps > 0) {
            return Err(ValidationError::OutOfRange {
                field: "rate".to_string(),
                min: 0,
                max: 1,
            });
        }

        Ok(Rate(whole * 10_000 + frac_bps))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// A sellable item with on-hand stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockItem {
    /// Business identifier, e.g. `"1001"`.
    pub item_id: String,

    pub name: String,

    /// Unit price in cents (≥ 0).
    pub price_cents: i64,

    /// Quantity on hand (never negative).
    pub quantity: i64,

    pub category: String,

    /// Inactive items cannot be sold.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the stock on hand.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Rental Asset
// =============================================================================

/// Equipment rented out by the day.
///
/// ## Invariant
/// `0 ≤ available_quantity ≤ total_quantity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RentalAsset {
    /// Business identifier, e.g. `"2001"`.
    pub rental_id: String,

    pub name: String,

    /// Daily price in cents (≥ 0).
    pub price_per_day_cents: i64,

    /// Units owned.
    pub total_quantity: i64,

    /// Units on the shelf right now.
    pub available_quantity: i64,

    pub category: String,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RentalAsset {
    /// Returns the daily price as Money.
    #[inline]
    pub fn price_per_day(&self) -> Money {
        Money::from_cents(self.price_per_day_cents)
    }

    /// Units currently checked out.
    #[inline]
    pub fn checked_out(&self) -> i64 {
        self.total_quantity - self.available_quantity
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountKind {
    /// `discount_value` is basis points of the subtotal (1000 = 10%).
    Percentage,
    /// `discount_value` is a flat amount in cents.
    Fixed,
}

impl DiscountKind {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

/// A named discount rule with eligibility and usage constraints.
///
/// Validity is derived: active AND not expired AND
/// (`usage_limit == 0` OR `usage_count < usage_limit`).
/// See [`crate::coupon`] for the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    /// Unique code, normalized to upper case.
    pub code: String,

    pub discount_kind: DiscountKind,

    /// Basis points for percentage coupons, cents for fixed ones.
    pub discount_value: i64,

    /// Minimum subtotal in cents for the coupon to apply.
    pub min_purchase_cents: i64,

    /// Optional cap on the computed discount, in cents.
    pub max_discount_cents: Option<i64>,

    /// Last day (inclusive) on which the coupon can be used.
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,

    /// 0 means unlimited.
    pub usage_limit: i64,

    pub usage_count: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Minimum purchase as Money.
    #[inline]
    pub fn min_purchase(&self) -> Money {
        Money::from_cents(self.min_purchase_cents)
    }

    /// Maximum discount cap as Money, if any.
    #[inline]
    pub fn max_discount(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
///
/// ## Invariants
/// - `subtotal = Σ line_total`
/// - `total = (subtotal − discount) + tax`, each rounded to cents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// Assigned by storage on commit.
    pub id: i64,

    /// Employee who rang the sale.
    pub employee_id: String,

    pub subtotal_cents: i64,

    pub discount_cents: i64,

    pub tax_cents: i64,

    pub total_cents: i64,

    /// Applied coupon, `None` when no discount was applied.
    pub coupon_code: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Line items in cart order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub lines: Vec<SaleLineItem>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Finds the line for an item.
    pub fn line_for(&self, item_id: &str) -> Option<&SaleLineItem> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }
}

/// One line of a committed sale. Name and price are snapshots taken at
/// sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLineItem {
    pub sale_id: i64,

    pub item_id: String,

    pub item_name: String,

    /// ≥ 1
    pub quantity: i64,

    pub unit_price_cents: i64,

    /// `quantity × unit_price_cents`
    pub line_total_cents: i64,
}

impl SaleLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A partial or full return against a committed sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturn {
    /// Assigned by storage on commit.
    pub id: i64,

    pub sale_id: i64,

    pub item_id: String,

    /// Item name as it was when the return was processed.
    pub item_name: String,

    pub quantity: i64,

    /// `unit_price × quantity` from the original line.
    pub refund_cents: i64,

    pub reason: String,

    /// Employee who processed the return.
    pub employee_id: String,

    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

impl SaleReturn {
    #[inline]
    pub fn refund(&self) -> Money {
        Money::from_cents(self.refund_cents)
    }
}

// =============================================================================
// Rental Checkout
// =============================================================================

/// A customer's checkout of one rental asset line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RentalCheckout {
    /// Assigned by storage on commit.
    pub id: i64,

    /// Ten-digit phone number; doubles as the customer key.
    pub customer_phone: String,

    pub rental_id: String,

    pub quantity: i64,

    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,

    pub is_returned: bool,

    /// Late fee charged on return, in cents (≥ 0).
    pub late_fee_cents: i64,
}

impl RentalCheckout {
    #[inline]
    pub fn late_fee(&self) -> Money {
        Money::from_cents(self.late_fee_cents)
    }
}

// =============================================================================
// Employee
// =============================================================================

/// Employee role. Drives authorization only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Role {
    Admin,
    Cashier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Cashier => write!(f, "Cashier"),
        }
    }
}

/// A back office employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub employee_id: String,

    pub role: Role,

    pub first_name: String,

    pub last_name: String,

    pub contact_number: Option<String>,

    pub email: Option<String>,

    /// PHC-format password hash. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A requested cart line: `quantity` units of `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub item_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// A requested rental line: `quantity` units of `rental_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalLine {
    pub rental_id: String,
    pub quantity: i64,
}

impl RentalLine {
    pub fn new(rental_id: impl Into<String>, quantity: i64) -> Self {
        RentalLine {
            rental_id: rental_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Receipts
// =============================================================================

/// Result of `process_return`: the persisted record plus the refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnReceipt {
    pub record: SaleReturn,
    pub refund_cents: i64,
}

/// A committed sale with the returns recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleHistory {
    pub sale: Sale,
    pub returns: Vec<SaleReturn>,
}

impl SaleHistory {
    /// Total refunded so far.
    pub fn refunded(&self) -> Money {
        self.returns.iter().map(SaleReturn::refund).sum()
    }
}

/// One line of a rental checkout receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalReceiptLine {
    pub checkout_id: i64,
    pub rental_id: String,
    pub name: String,
    pub quantity: i64,
    pub price_per_day_cents: i64,
    /// `price_per_day × quantity`
    pub line_amount_cents: i64,
}

/// Result of `checkout_rental`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalReceipt {
    pub customer_phone: String,
    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub lines: Vec<RentalReceiptLine>,
    /// Σ line amounts (one day's charge; display only).
    pub total_amount_cents: i64,
}

/// One processed line of a rental return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalReturnLine {
    pub checkout_id: i64,
    pub rental_id: String,
    pub name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub days_late: i64,
    pub late_fee_cents: i64,
}

/// Result of `return_rental`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalReturnReceipt {
    pub customer_phone: String,
    #[ts(as = "String")]
    pub return_date: DateTime<Utc>,
    pub lines: Vec<RentalReturnLine>,
    pub total_late_fee_cents: i64,
}

impl RentalReturnReceipt {
    pub fn total_late_fee(&self) -> Money {
        Money::from_cents(self.total_late_fee_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_parse_fraction() {
        assert_eq!(Rate::parse_fraction("0.08").unwrap(), Rate::from_bps(800));
        assert_eq!(Rate::parse_fraction("0.10").unwrap(), Rate::from_bps(1000));
        assert_eq!(Rate::parse_fraction(".1").unwrap(), Rate::from_bps(1000));
        assert_eq!(Rate::parse_fraction("0").unwrap(), Rate::zero());
        assert!(Rate::parse_fraction("").is_err());
        assert!(Rate::parse_fraction("abc").is_err());
        assert!(Rate::parse_fraction("-0.1").is_err());
        assert!(Rate::parse_fraction("1.5").is_err());
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_bps(825).to_string(), "8.25%");
        assert_eq!(Rate::from_percent(10).to_string(), "10.00%");
    }

    #[test]
    fn test_rental_asset_checked_out() {
        let now = Utc::now();
        let asset = RentalAsset {
            rental_id: "2001".to_string(),
            name: "Projector".to_string(),
            price_per_day_cents: 5000,
            total_quantity: 5,
            available_quantity: 3,
            category: "AV".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(asset.checked_out(), 2);
        assert_eq!(asset.price_per_day().cents(), 5000);
    }

    #[test]
    fn test_employee_hash_not_serialized() {
        let employee = Employee {
            employee_id: "E1".to_string(),
            role: Role::Cashier,
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            contact_number: None,
            email: None,
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&employee).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(employee.full_name(), "Sam Lee");
    }
}
