//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A late fee of 50.00 × 1 × 0.10 × 3 may land on 14.999999...           │
//! │  and round to 14.99 instead of 15.00.                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis Points                             │
//! │    5000 cents × 1 × 1000 bps × 3 / 10000 = 1500 cents                  │
//! │    Every derived amount is rounded half-up exactly once                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1000); // $10.00
//! let line = price * 2i64;              // $20.00
//! let total = line + Money::from_cents(160); // $21.60
//! assert_eq!(total.cents(), 2160);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

/// Denominator of a basis-point rate (10000 bps = 100%).
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Half-up rounding**: every derived amount (tax, percentage discount,
///   late fee) rounds 0.5 cent away from zero
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StockItem.price ──► SaleLineItem.unit_price ──► line_total             │
/// │                                                      │                  │
/// │                                              Σ ──► subtotal             │
/// │                                                      │                  │
/// │  Coupon ──► discount ──► taxable ──► tax ──► total ──┘                  │
/// │                                                                         │
/// │  RentalAsset.price_per_day ──► rental line ──► late fee                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(50, 0).cents(), 5000);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a basis-point rate and rounds the result half-up to cents.
    ///
    /// This is the `percentOf` of the back office: tax, percentage coupons
    /// and the late-fee rate all go through it.
    ///
    /// ## Implementation
    /// Integer math on i128: `(amount × bps ± 5000) / 10000`, where the
    /// ±5000 rounds half a cent away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Rate;
    ///
    /// let taxable = Money::from_cents(1800); // $18.00
    /// let tax = taxable.apply_rate(Rate::from_bps(800)); // 8%
    /// assert_eq!(tax.cents(), 144);
    ///
    /// // $10.00 × 8.25% = $0.825 → $0.83
    /// assert_eq!(Money::from_cents(1000).apply_rate(Rate::from_bps(825)).cents(), 83);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        Money::from_cents(scale_half_up(self.0 as i128 * rate.bps() as i128))
    }

    /// Applies a rate to this amount repeated `units` times, rounding once.
    ///
    /// Used for late fees: `price × quantity × rate × days` must round once
    /// at the end, not per day.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Rate;
    ///
    /// let price_per_day = Money::from_cents(5000);
    /// // 50.00 × 1 × 10% × 3 days = 15.00
    /// let fee = price_per_day.apply_rate_times(Rate::from_bps(1000), 3);
    /// assert_eq!(fee.cents(), 1500);
    /// ```
    pub fn apply_rate_times(&self, rate: Rate, units: i64) -> Money {
        let raw = self.0 as i128 * rate.bps() as i128 * units as i128;
        Money::from_cents(scale_half_up(raw))
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamps a negative amount to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

/// Divides a value scaled by basis points back to cents, rounding half-up
/// (half a cent away from zero).
fn scale_half_up(scaled: i128) -> i64 {
    let half = BPS_SCALE / 2;
    let cents = if scaled >= 0 {
        (scaled + half) / BPS_SCALE
    } else {
        -((-scaled + half) / BPS_SCALE)
    };
    cents as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$D.CC` for logs and receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
