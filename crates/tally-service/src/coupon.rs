//! # Coupon Validator
//!
//! Looks a coupon up and runs the eligibility rules from
//! `tally_core::coupon` against a subtotal.
//!
//! ```text
//! raw code ──normalize──► "SAVE10" ──read_coupon──► Coupon ──evaluate──► CouponApplication
//!                 │                        │                    │
//!                 ▼                        ▼                    ▼
//!          CouponNotFound           CouponNotFound     Inactive / Expired /
//!       (blank or too long)                            Exhausted / MinimumPurchase
//! ```
//!
//! Validation never writes. The sale pipeline increments usage itself,
//! once, inside the sale's transaction.

use chrono::NaiveDate;
use tracing::debug;

use tally_core::coupon::{evaluate, CouponApplication};
use tally_core::store::{CouponStore, Storage};
use tally_core::validation::normalize_coupon_code;
use tally_core::{Clock, CoreError, CoreResult, Money};

/// Validates `code` against `subtotal` using an open transaction.
pub async fn validate_coupon<T>(tx: &mut T, code: &str, subtotal: Money, today: NaiveDate) -> CoreResult<CouponApplication>
where
    T: CouponStore + Send,
{
    let normalized = match normalize_coupon_code(Some(code)) {
        Ok(Some(normalized)) => normalized,
        Ok(None) | Err(_) => return Err(CoreError::CouponNotFound(code.trim().to_string())),
    };

    let coupon = tx
        .read_coupon(&normalized)
        .await?
        .ok_or_else(|| CoreError::CouponNotFound(normalized.clone()))?;

    let application = evaluate(&coupon, subtotal, today)?;
    debug!(
        code = %application.code,
        subtotal = %subtotal,
        discount = %application.discount(),
        "Coupon validated"
    );
    Ok(application)
}

/// Read-only coupon check, for showing a discount before checkout.
#[derive(Debug, Clone)]
pub struct CouponService<S, C> {
    storage: S,
    clock: C,
}

impl<S, C> CouponService<S, C>
where
    S: Storage,
    C: Clock,
{
    pub fn new(storage: S, clock: C) -> Self {
        CouponService { storage, clock }
    }

    /// Validates a coupon against a subtotal without consuming a use.
    pub async fn validate(&self, code: &str, subtotal: Money) -> CoreResult<CouponApplication> {
        // Never committed; the transaction only gives a consistent read.
        let mut tx = self.storage.begin().await?;
        validate_coupon(&mut tx, code, subtotal, self.clock.today()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, coupon, seeded_db};
    use tally_core::{DiscountKind, FixedClock};

    #[tokio::test]
    async fn test_percentage_coupon() {
        let db = seeded_db().await;
        let service = CouponService::new(db, FixedClock::new(at(2026, 3, 15, 12)));

        let app = service.validate(" save10 ", Money::from_cents(2000)).await.unwrap();
        assert_eq!(app.code, "SAVE10");
        assert_eq!(app.discount_cents, 200);
    }

    #[tokio::test]
    async fn test_rejections() {
        let db = seeded_db().await;

        let mut capped = coupon("CAPPED", DiscountKind::Percentage, 5000);
        capped.max_discount_cents = Some(300);
        db.coupons().insert(&capped).await.unwrap();

        let mut minimum = coupon("BIGSPEND", DiscountKind::Fixed, 500);
        minimum.min_purchase_cents = 5000;
        db.coupons().insert(&minimum).await.unwrap();

        let mut expired = coupon("OLD", DiscountKind::Fixed, 500);
        expired.expiration_date = NaiveDate::from_ymd_opt(2026, 3, 14);
        db.coupons().insert(&expired).await.unwrap();

        let service = CouponService::new(db.clone(), FixedClock::new(at(2026, 3, 15, 12)));

        let app = service.validate("CAPPED", Money::from_cents(2000)).await.unwrap();
        assert_eq!(app.discount_cents, 300);

        assert!(matches!(
            service.validate("BIGSPEND", Money::from_cents(4999)).await,
            Err(CoreError::MinimumPurchaseNotMet { minimum_cents: 5000, .. })
        ));
        assert!(matches!(
            service.validate("OLD", Money::from_cents(2000)).await,
            Err(CoreError::CouponExpired(_))
        ));
        assert!(matches!(
            service.validate("NOPE", Money::from_cents(2000)).await,
            Err(CoreError::CouponNotFound(_))
        ));
        assert!(matches!(
            service.validate("   ", Money::from_cents(2000)).await,
            Err(CoreError::CouponNotFound(_))
        ));

        db.coupons().deactivate("SAVE10").await.unwrap();
        assert!(matches!(
            service.validate("SAVE10", Money::from_cents(2000)).await,
            Err(CoreError::CouponInactive(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_does_not_consume() {
        let db = seeded_db().await;
        let service = CouponService::new(db.clone(), FixedClock::new(at(2026, 3, 15, 12)));
        service.validate("SAVE10", Money::from_cents(2000)).await.unwrap();

        let stored = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 0);
    }
}
