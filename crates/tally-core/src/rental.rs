//! # Rental Math
//!
//! Due dates, lateness and late fees for rental checkouts.
//!
//! ## Late Fee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  days_late = max(0, date(returned) − date(due))   (UTC calendar days)  │
//! │  late_fee  = round_half_up(price_per_day × qty × rate × days_late)     │
//! │                                                                         │
//! │  due 2026-03-15 14:00, returned 2026-03-15 23:59 → 0 days, fee 0       │
//! │  due 2026-03-15 14:00, returned 2026-03-16 00:01 → 1 day               │
//! │  $50.00/day × 1 × 10% × 3 days → $15.00                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Rate, RentalLine};
use crate::validation::{validate_identifier, validate_quantity};

/// Due date for a checkout made at `rental_date`.
pub fn due_date(rental_date: DateTime<Utc>, period_days: i64) -> DateTime<Utc> {
    rental_date + Duration::days(period_days)
}

/// Whole calendar days between due date and return, never negative.
/// Both instants are truncated to their UTC date first, so returning on
/// the due date is never late.
pub fn days_late(due: DateTime<Utc>, returned: DateTime<Utc>) -> i64 {
    let days = (returned.date_naive() - due.date_naive()).num_days();
    days.max(0)
}

/// Late fee for one checkout line.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::rental::late_fee;
/// use tally_core::types::Rate;
///
/// let fee = late_fee(Money::from_cents(5000), 1, Rate::from_bps(1000), 3);
/// assert_eq!(fee.cents(), 1500);
/// assert_eq!(late_fee(Money::from_cents(5000), 1, Rate::from_bps(1000), 0).cents(), 0);
/// ```
pub fn late_fee(price_per_day: Money, quantity: i64, rate: Rate, days_late: i64) -> Money {
    if days_late <= 0 {
        return Money::zero();
    }
    price_per_day
        .multiply_quantity(quantity)
        .apply_rate_times(rate, days_late)
}

/// Validates and merges a rental checkout request, same rules as the
/// cart: repeated assets are combined, quantities must be positive.
pub fn normalize_rental_request(lines: &[RentalLine]) -> CoreResult<Vec<RentalLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyRentalRequest);
    }

    let mut merged: Vec<RentalLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_identifier("rental_id", &line.rental_id)?;

        let rental_id = line.rental_id.trim();
        match merged.iter_mut().find(|m| m.rental_id == rental_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(RentalLine::new(rental_id, line.quantity)),
        }
    }
    for line in &merged {
        validate_quantity(line.quantity)?;
    }

    Ok(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================
