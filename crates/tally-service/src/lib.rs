//! # tally-service: Back Office Pipelines
//!
//! The operations a back office performs, written once against the
//! `tally-core` capabilities ([`Storage`], [`ReportStore`], [`Clock`]).
//!
//! ## Pipelines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Backoffice                                   │
//! │                                                                         │
//! │  SaleService      cart + coupon ─► reserve stock, price, tax, persist   │
//! │  ReturnService    sale line     ─► flat refund, restock                 │
//! │  RentalService    phone + lines ─► reserve units, due date              │
//! │                   phone         ─► late fees, release units             │
//! │  CouponService    code + total  ─► discount preview (no writes)         │
//! │  ReportService    principal     ─► sales, inventory, rentals            │
//! │                                                                         │
//! │  Each mutating call is one storage transaction: all rows or none.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_core::{CartLine, SystemClock};
//! use tally_db::{Database, DbConfig};
//! use tally_service::{telemetry, Backoffice, ServiceConfig};
//!
//! telemetry::init_tracing();
//! let config = ServiceConfig::from_env()?;
//! let db = Database::new(DbConfig::new(&config.database_path)).await?;
//! let office = Backoffice::from_config(db, SystemClock, &config);
//!
//! let sale = office.sales.process_sale("C1001", &[CartLine::new("1001", 2)], Some("SAVE10")).await?;
//! ```

pub mod config;
pub mod coupon;
pub mod rental;
pub mod report;
pub mod returns;
pub mod sale;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, ServiceConfig};
pub use coupon::{validate_coupon, CouponService};
pub use rental::RentalService;
pub use report::ReportService;
pub use returns::ReturnService;
pub use sale::SaleService;

use tally_core::store::{ReportStore, Storage};
use tally_core::{Clock, Policy};

/// Every pipeline over one storage handle, one clock and one policy.
#[derive(Debug, Clone)]
pub struct Backoffice<S, C> {
    pub sales: SaleService<S, C>,
    pub returns: ReturnService<S, C>,
    pub rentals: RentalService<S, C>,
    pub coupons: CouponService<S, C>,
    pub reports: ReportService<S, C>,
}

impl<S, C> Backoffice<S, C>
where
    S: Storage + ReportStore + Clone,
    C: Clock + Clone,
{
    pub fn new(storage: S, clock: C, policy: Policy) -> Self {
        Backoffice {
            sales: SaleService::new(storage.clone(), clock.clone(), policy.clone()),
            returns: ReturnService::new(storage.clone(), clock.clone()),
            rentals: RentalService::new(storage.clone(), clock.clone(), policy.clone()),
            coupons: CouponService::new(storage.clone(), clock.clone()),
            reports: ReportService::new(storage, clock, policy),
        }
    }

    /// Builds the pipelines with the policy from `config`. The storage is
    /// expected to be opened on `config.database_path`.
    pub fn from_config(storage: S, clock: C, config: &ServiceConfig) -> Self {
        Self::new(storage, clock, config.policy.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, seeded_db};
    use tally_core::{CartLine, CoreError, FixedClock, Money, Principal, RentalLine, Role};

    #[tokio::test]
    async fn test_backoffice_shares_policy_and_storage() {
        let config = ServiceConfig::from_lookup(|key| match key {
            "TALLY_TAX_RATE" => Some("0.05".to_string()),
            "TALLY_COUPON_POLICY" => Some("strict".to_string()),
            _ => None,
        })
        .unwrap();
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 15, 12));
        let office = Backoffice::from_config(db, clock.clone(), &config);

        let preview = office.coupons.validate("save10", Money::from_cents(2000)).await.unwrap();
        assert_eq!(preview.discount_cents, 200);

        // 2000 - 200 = 1800, 5% tax = 90
        let sale = office
            .sales
            .process_sale("C1001", &[CartLine::new("1001", 2)], Some("save10"))
            .await
            .unwrap();
        assert_eq!(sale.total_cents, 1890);

        assert!(matches!(
            office.sales.process_sale("C1001", &[CartLine::new("1001", 1)], Some("NOPE")).await,
            Err(CoreError::CouponNotFound(_))
        ));

        office
            .returns
            .process_return(sale.id, "1001", 1, Some("Changed mind"), "C1001")
            .await
            .unwrap();
        office
            .rentals
            .checkout_rental("5551234567", &[RentalLine::new("2001", 1)])
            .await
            .unwrap();

        clock.advance(chrono::Duration::hours(1));
        let report = office
            .reports
            .sales_report(&Principal::new("A1001", Role::Admin), at(2026, 3, 15, 0), at(2026, 3, 16, 0))
            .await
            .unwrap();
        assert_eq!(report.sale_count, 1);
        assert_eq!(report.refund_cents, 1000);
    }
}
