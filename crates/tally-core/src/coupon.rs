//! # Coupon Rules
//!
//! Eligibility and discount computation for coupons. The lookup step lives
//! with the pipelines (it needs storage); everything after the lookup is
//! here.
//!
//! ## Validation Order
//! ```text
//! lookup(code)          → CouponNotFound        (caller)
//!   │
//!   ▼
//! is_active?            → CouponInactive
//! expiration ≥ today?   → CouponExpired
//! limit == 0 ∨ count < limit? → CouponExhausted
//! subtotal ≥ minimum?   → MinimumPurchaseNotMet
//!   │
//!   ▼
//! raw = percentage ? subtotal × value : value
//! discount = min(raw, max_discount, subtotal)
//! ```
//!
//! Usage is NOT incremented here. The sale pipeline increments it once,
//! inside the sale's transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Coupon, DiscountKind, Rate};

/// A successfully validated coupon and the discount it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponApplication {
    pub code: String,
    pub discount_cents: i64,
}

impl CouponApplication {
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

impl Coupon {
    /// True once the expiration date has passed. The expiration date itself
    /// is still usable.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|exp| exp < today)
    }

    /// True when a non-zero usage limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.usage_count >= self.usage_limit
    }

    /// Derived validity: active, not expired, not exhausted.
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.is_active && !self.is_expired(today) && !self.is_exhausted()
    }

    /// Computes the discount this coupon grants on `subtotal`, ignoring
    /// eligibility. Never exceeds the cap or the subtotal itself.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// # use tally_core::types::{Coupon, DiscountKind};
    /// # use tally_core::money::Money;
    /// let coupon = Coupon {
    ///     code: "SAVE10".into(),
    ///     discount_kind: DiscountKind::Percentage,
    ///     discount_value: 1000, // 10%
    ///     min_purchase_cents: 0,
    ///     max_discount_cents: None,
    ///     expiration_date: None,
    ///     usage_limit: 0,
    ///     usage_count: 0,
    ///     is_active: true,
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(coupon.discount_for(Money::from_cents(2000)).cents(), 200);
    /// ```
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.discount_kind {
            DiscountKind::Percentage => {
                let bps = self.discount_value.clamp(0, 10_000) as u32;
                subtotal.apply_rate(Rate::from_bps(bps))
            }
            DiscountKind::Fixed => Money::from_cents(self.discount_value),
        };

        let capped = match self.max_discount() {
            Some(cap) if raw > cap => cap,
            _ => raw,
        };

        capped.min(subtotal).non_negative()
    }
}

/// Runs the eligibility checks and computes the discount.
///
/// `today` is the calendar date the sale happens on.
pub fn evaluate(coupon: &Coupon, subtotal: Money, today: NaiveDate) -> CoreResult<CouponApplication> {
    if !coupon.is_active {
        return Err(CoreError::CouponInactive(coupon.code.clone()));
    }
    if coupon.is_expired(today) {
        return Err(CoreError::CouponExpired(coupon.code.clone()));
    }
    if coupon.is_exhausted() {
        return Err(CoreError::CouponExhausted(coupon.code.clone()));
    }
    if subtotal < coupon.min_purchase() {
        return Err(CoreError::MinimumPurchaseNotMet {
            code: coupon.code.clone(),
            minimum_cents: coupon.min_purchase_cents,
            subtotal_cents: subtotal.cents(),
        });
    }

    Ok(CouponApplication {
        code: coupon.code.clone(),
        discount_cents: coupon.discount_for(subtotal).cents(),
    })
}

/// Checks an administered coupon definition before it is stored.
///
/// ## Rules
/// - value must be positive
/// - percentage value at most 10000 bps (100%)
/// - minimum purchase and cap non-negative
pub fn validate_definition(coupon: &Coupon) -> Result<(), ValidationError> {
    if coupon.code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }
    if coupon.discount_value <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount_value".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }
    if coupon.discount_kind == DiscountKind::Percentage && coupon.discount_value > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount_value".to_string(),
            min: 1,
            max: 10_000,
        });
    }
    if coupon.min_purchase_cents < 0 || coupon.max_discount_cents.is_some_and(|m| m < 0) {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    if coupon.usage_limit < 0 {
        return Err(ValidationError::OutOfRange {
            field: "usage_limit".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn coupon(kind: DiscountKind, value: i64) -> Coupon {
        Coupon {
            code: "SAVE10".to_string(),
            discount_kind: kind,
            discount_value: value,
            min_purchase_cents: 0,
            max_discount_cents: None,
            expiration_date: None,
            usage_limit: 0,
            usage_count: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentage_discount() {
        let app = evaluate(&coupon(DiscountKind::Percentage, 1000), Money::from_cents(2000), today()).unwrap();
        assert_eq!(app.discount_cents, 200);
        assert_eq!(app.code, "SAVE10");
    }

    #[test]
    fn test_fixed_discount_clamped_to_cap_and_subtotal() {
        let mut c = coupon(DiscountKind::Fixed, 1500);
        c.max_discount_cents = Some(1000);
        assert_eq!(c.discount_for(Money::from_cents(5000)).cents(), 1000);

        let c = coupon(DiscountKind::Fixed, 1500);
        assert_eq!(c.discount_for(Money::from_cents(800)).cents(), 800);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 12.5% of 0.04 = 0.005 → 0.01
        let c = coupon(DiscountKind::Percentage, 1250);
        assert_eq!(c.discount_for(Money::from_cents(4)).cents(), 1);
    }

    #[test]
    fn test_inactive() {
        let mut c = coupon(DiscountKind::Fixed, 100);
        c.is_active = false;
        assert!(matches!(
            evaluate(&c, Money::from_cents(1000), today()),
            Err(CoreError::CouponInactive(_))
        ));
    }

    #[test]
    fn test_expiration_is_inclusive() {
        let mut c = coupon(DiscountKind::Fixed, 100);
        c.expiration_date = Some(today());
        assert!(evaluate(&c, Money::from_cents(1000), today()).is_ok());

        c.expiration_date = today().pred_opt();
        assert!(matches!(
            evaluate(&c, Money::from_cents(1000), today()),
            Err(CoreError::CouponExpired(_))
        ));
    }

    #[test]
    fn test_exhausted() {
        let mut c = coupon(DiscountKind::Fixed, 100);
        c.usage_limit = 2;
        c.usage_count = 2;
        assert!(c.is_exhausted());
        assert!(matches!(
            evaluate(&c, Money::from_cents(1000), today()),
            Err(CoreError::CouponExhausted(_))
        ));

        c.usage_limit = 0;
        assert!(!c.is_exhausted());
        assert!(c.is_valid(today()));
    }

    #[test]
    fn test_minimum_purchase() {
        let mut c = coupon(DiscountKind::Fixed, 100);
        c.min_purchase_cents = 5000;
        assert!(matches!(
            evaluate(&c, Money::from_cents(4999), today()),
            Err(CoreError::MinimumPurchaseNotMet { minimum_cents: 5000, .. })
        ));
        assert!(evaluate(&c, Money::from_cents(5000), today()).is_ok());
    }

    #[test]
    fn test_validate_definition() {
        assert!(validate_definition(&coupon(DiscountKind::Percentage, 1000)).is_ok());
        assert!(validate_definition(&coupon(DiscountKind::Percentage, 10_001)).is_err());
        assert!(validate_definition(&coupon(DiscountKind::Fixed, 0)).is_err());
    }
}
