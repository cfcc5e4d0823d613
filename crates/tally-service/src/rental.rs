//! # Rental Pipeline
//!
//! Checkout and return of rental assets, keyed by customer phone.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout_rental(phone, [{rental_id, qty}])                             │
//! │     validate phone (10 digits), merge lines                             │
//! │     BEGIN                                                               │
//! │       per line: read asset → reserve units      RentalNotFound /       │
//! │                                                 RentalUnavailable      │
//! │       ensure customer row (walk-ups welcome)                            │
//! │       per line: available −= qty, insert checkout                      │
//! │     COMMIT      due = now + rental period                               │
//! │                                                                         │
//! │  return_rental(phone)                                                   │
//! │     BEGIN                                                               │
//! │       outstanding checkouts (oldest first)      NoOutstandingRentals   │
//! │       per checkout: days late on UTC dates → late fee                  │
//! │                     available += qty (capped at total)                 │
//! │                     mark returned with fee                             │
//! │     COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Late fee per checkout: `price/day × qty × late fee rate × days late`,
//! rounded once. Returning on the due date is never late.

use tracing::{debug, info, warn};

use tally_core::rental::{days_late, due_date, late_fee, normalize_rental_request};
use tally_core::stock::{release_rental_units, reserve_rental_units};
use tally_core::store::{RentalStore, Storage, Transaction};
use tally_core::validation::validate_phone_number;
use tally_core::{
    Clock, CoreError, CoreResult, Money, Policy, RentalCheckout, RentalLine, RentalReceipt, RentalReceiptLine,
    RentalReturnLine, RentalReturnReceipt,
};

/// The rental pipeline.
#[derive(Debug, Clone)]
pub struct RentalService<S, C> {
    storage: S,
    clock: C,
    policy: Policy,
}

impl<S, C> RentalService<S, C>
where
    S: Storage,
    C: Clock,
{
    pub fn new(storage: S, clock: C, policy: Policy) -> Self {
        RentalService { storage, clock, policy }
    }

    /// Checks rental units out to a customer.
    ///
    /// The receipt total is one day's charge for every line; what the
    /// customer finally owes on top is decided at return time.
    pub async fn checkout_rental(&self, customer_phone: &str, lines: &[RentalLine]) -> CoreResult<RentalReceipt> {
        let phone = validate_phone_number(customer_phone)?;
        let lines = normalize_rental_request(lines)?;
        let rental_date = self.clock.now();
        let due = due_date(rental_date, self.policy.rental_period_days);

        debug!(phone = %phone, lines = lines.len(), "Processing rental checkout");

        let mut tx = self.storage.begin().await?;

        let mut reserved = Vec::with_capacity(lines.len());
        for line in &lines {
            let asset = tx
                .read_rental_asset(&line.rental_id)
                .await?
                .filter(|asset| asset.is_active)
                .ok_or_else(|| CoreError::RentalNotFound(line.rental_id.clone()))?;

            let adjustment = reserve_rental_units(&asset, line.quantity)?;
            reserved.push((asset, adjustment, line.quantity));
        }

        tx.ensure_customer(&phone, rental_date).await?;

        let mut receipt_lines = Vec::with_capacity(reserved.len());
        for (asset, adjustment, quantity) in &reserved {
            tx.apply_rental_adjustment(adjustment, rental_date).await?;

            let checkout = RentalCheckout {
                id: 0,
                customer_phone: phone.clone(),
                rental_id: asset.rental_id.clone(),
                quantity: *quantity,
                rental_date,
                due_date: due,
                return_date: None,
                is_returned: false,
                late_fee_cents: 0,
            };
            let checkout_id = tx.insert_rental_checkout(&checkout).await?;

            receipt_lines.push(RentalReceiptLine {
                checkout_id,
                rental_id: asset.rental_id.clone(),
                name: asset.name.clone(),
                quantity: *quantity,
                price_per_day_cents: asset.price_per_day_cents,
                line_amount_cents: asset.price_per_day().multiply_quantity(*quantity).cents(),
            });
        }

        tx.commit().await?;

        let total: Money = receipt_lines
            .iter()
            .map(|l| Money::from_cents(l.line_amount_cents))
            .sum();

        info!(
            phone = %phone,
            checkouts = receipt_lines.len(),
            total = %total,
            due_date = %due,
            "Rental checkout committed"
        );

        Ok(RentalReceipt {
            customer_phone: phone,
            rental_date,
            due_date: due,
            lines: receipt_lines,
            total_amount_cents: total.cents(),
        })
    }

    /// Returns everything a customer has out, charging late fees.
    pub async fn return_rental(&self, customer_phone: &str) -> CoreResult<RentalReturnReceipt> {
        let phone = validate_phone_number(customer_phone)?;
        let return_date = self.clock.now();

        let mut tx = self.storage.begin().await?;

        let outstanding = tx.read_outstanding_rentals(&phone).await?;
        if outstanding.is_empty() {
            return Err(CoreError::NoOutstandingRentals(phone));
        }

        debug!(phone = %phone, checkouts = outstanding.len(), "Processing rental return");

        let mut lines = Vec::with_capacity(outstanding.len());
        for checkout in &outstanding {
            // Re-read per checkout: earlier lines may have released units
            // of the same asset.
            let asset = tx
                .read_rental_asset(&checkout.rental_id)
                .await?
                .ok_or_else(|| CoreError::RentalNotFound(checkout.rental_id.clone()))?;

            let days = days_late(checkout.due_date, return_date);
            let fee = late_fee(asset.price_per_day(), checkout.quantity, self.policy.late_fee_rate, days);

            let (adjustment, dropped) = release_rental_units(&asset, checkout.quantity);
            if dropped > 0 {
                warn!(
                    rental_id = %asset.rental_id,
                    checkout_id = checkout.id,
                    returned = checkout.quantity,
                    dropped = dropped,
                    "Release capped at total quantity"
                );
            }
            tx.apply_rental_adjustment(&adjustment, return_date).await?;
            tx.mark_rental_returned(checkout.id, return_date, fee).await?;

            lines.push(RentalReturnLine {
                checkout_id: checkout.id,
                rental_id: asset.rental_id.clone(),
                name: asset.name.clone(),
                quantity: checkout.quantity,
                due_date: checkout.due_date,
                days_late: days,
                late_fee_cents: fee.cents(),
            });
        }

        tx.commit().await?;

        let total_late_fee: Money = lines.iter().map(|l| Money::from_cents(l.late_fee_cents)).sum();

        info!(
            phone = %phone,
            checkouts = lines.len(),
            late_fees = %total_late_fee,
            "Rental return committed"
        );

        Ok(RentalReturnReceipt {
            customer_phone: phone,
            return_date,
            lines,
            total_late_fee_cents: total_late_fee.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{asset, at, seeded_db};
    use chrono::Duration;
    use tally_core::{ErrorKind, FixedClock};
    use tally_db::Database;

    const PHONE: &str = "5551234567";

    fn service(db: &Database, clock: &FixedClock) -> RentalService<Database, FixedClock> {
        RentalService::new(db.clone(), clock.clone(), Policy::default())
    }

    async fn available(db: &Database, rental_id: &str) -> i64 {
        db.rentals().get_by_id(rental_id).await.unwrap().unwrap().available_quantity
    }

    #[tokio::test]
    async fn test_checkout_and_late_return() {
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);

        let receipt = rentals
            .checkout_rental(" 5551234567 ", &[RentalLine::new("2001", 1)])
            .await
            .unwrap();

        assert_eq!(receipt.customer_phone, PHONE);
        assert_eq!(receipt.rental_date, at(2026, 3, 1, 10));
        assert_eq!(receipt.due_date, at(2026, 3, 15, 10));
        assert_eq!(receipt.total_amount_cents, 5000);
        assert_eq!(receipt.lines.len(), 1);
        assert!(receipt.lines[0].checkout_id > 0);
        assert_eq!(available(&db, "2001").await, 4);
        assert!(db.rentals().customer_exists(PHONE).await.unwrap());

        // Three calendar days after the due date
        clock.set(at(2026, 3, 18, 9));
        let returned = rentals.return_rental(PHONE).await.unwrap();

        assert_eq!(returned.lines.len(), 1);
        assert_eq!(returned.lines[0].days_late, 3);
        assert_eq!(returned.lines[0].late_fee_cents, 1500);
        assert_eq!(returned.total_late_fee().to_string(), "$15.00");
        let stored = db.rentals().get_by_id("2001").await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 5);
        assert_eq!(stored.updated_at, at(2026, 3, 18, 9));

        let history = db.rentals().history_for(PHONE).await.unwrap();
        assert!(history[0].is_returned);
        assert_eq!(history[0].late_fee_cents, 1500);
        assert_eq!(history[0].return_date, Some(at(2026, 3, 18, 9)));
    }

    #[tokio::test]
    async fn test_no_fee_on_due_date_and_one_day_after() {
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);

        rentals.checkout_rental(PHONE, &[RentalLine::new("2001", 1)]).await.unwrap();
        clock.set(at(2026, 3, 15, 23));
        let on_time = rentals.return_rental(PHONE).await.unwrap();
        assert_eq!(on_time.lines[0].days_late, 0);
        assert_eq!(on_time.total_late_fee_cents, 0);

        clock.set(at(2026, 4, 1, 10));
        rentals.checkout_rental(PHONE, &[RentalLine::new("2001", 2)]).await.unwrap();
        clock.advance(Duration::days(15));
        let late = rentals.return_rental(PHONE).await.unwrap();
        assert_eq!(late.lines[0].days_late, 1);
        // 50.00 × 2 × 10% × 1
        assert_eq!(late.total_late_fee_cents, 1000);
    }

    #[tokio::test]
    async fn test_return_processes_every_outstanding_checkout() {
        let db = seeded_db().await;
        db.rentals().insert(&asset("2002", 1250, 3)).await.unwrap();
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);

        rentals
            .checkout_rental(PHONE, &[RentalLine::new("2001", 2), RentalLine::new("2002", 1)])
            .await
            .unwrap();
        clock.advance(Duration::days(1));
        rentals.checkout_rental(PHONE, &[RentalLine::new("2001", 1)]).await.unwrap();
        assert_eq!(available(&db, "2001").await, 2);
        assert_eq!(available(&db, "2002").await, 2);

        clock.advance(Duration::days(15));
        let receipt = rentals.return_rental(PHONE).await.unwrap();

        // Oldest first: the day-one checkouts are 2 days late, the second 1
        let days: Vec<i64> = receipt.lines.iter().map(|l| l.days_late).collect();
        assert_eq!(days, vec![2, 2, 1]);
        // 5000×2×10%×2 + 1250×1×10%×2 + 5000×1×10%×1
        assert_eq!(receipt.total_late_fee_cents, 2000 + 250 + 500);
        assert_eq!(available(&db, "2001").await, 5);
        assert_eq!(available(&db, "2002").await, 3);

        assert!(matches!(
            rentals.return_rental(PHONE).await,
            Err(CoreError::NoOutstandingRentals(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_failures_reserve_nothing() {
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);

        let err = rentals.checkout_rental("555-1234", &[RentalLine::new("2001", 1)]).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPhoneNumber(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = rentals.checkout_rental(PHONE, &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyRentalRequest));

        let err = rentals
            .checkout_rental(PHONE, &[RentalLine::new("2001", 1), RentalLine::new("2999", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RentalNotFound(ref id) if id == "2999"));

        let err = rentals
            .checkout_rental(PHONE, &[RentalLine::new("2001", 4), RentalLine::new("2001", 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RentalUnavailable { available: 5, requested: 6, .. }));

        assert_eq!(available(&db, "2001").await, 5);
        assert!(!db.rentals().customer_exists(PHONE).await.unwrap());
    }

    #[tokio::test]
    async fn test_availability_stays_within_bounds() {
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);
        let phones = ["5550000001", "5550000002", "5550000003"];

        for phone in phones {
            rentals.checkout_rental(phone, &[RentalLine::new("2001", 1)]).await.unwrap();
            let n = available(&db, "2001").await;
            assert!((0..=5).contains(&n));
        }
        let err = rentals
            .checkout_rental("5550000004", &[RentalLine::new("2001", 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RentalUnavailable { available: 2, .. }));

        for phone in phones {
            rentals.return_rental(phone).await.unwrap();
            let n = available(&db, "2001").await;
            assert!((0..=5).contains(&n));
        }
        assert_eq!(available(&db, "2001").await, 5);
    }

    #[tokio::test]
    async fn test_inactive_asset_cannot_be_checked_out() {
        let db = seeded_db().await;
        insert_retired_asset(&db).await;
        let clock = FixedClock::new(at(2026, 3, 1, 10));
        let rentals = service(&db, &clock);

        let err = rentals.checkout_rental(PHONE, &[RentalLine::new("2003", 1)]).await.unwrap_err();
        assert!(matches!(err, CoreError::RentalNotFound(_)));
    }

    async fn insert_retired_asset(db: &Database) {
        let mut retired = asset("2003", 1000, 1);
        retired.is_active = false;
        db.rentals().insert(&retired).await.unwrap();
    }
}
