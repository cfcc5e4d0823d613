//! # Reports
//!
//! Read-only aggregates over committed data. Every call takes the
//! [`Principal`] asking for it and checks the role first.
//!
//! | Report                 | Role     |
//! |------------------------|----------|
//! | `sales_report`         | Cashier  |
//! | `inventory_report`     | Cashier  |
//! | `top_selling_items`    | Admin    |
//! | `employee_performance` | Admin    |
//! | `rental_report`        | Admin    |
//!
//! Admin satisfies every role. Windows are half-open `[from, to)`.

use chrono::{DateTime, Utc};
use tracing::debug;

use tally_core::report::{
    employee_performance, summarize_inventory, summarize_rentals, summarize_sales, top_selling, EmployeePerformance,
    InventoryReport, RentalReport, SalesReport, TopSellingItem,
};
use tally_core::store::ReportStore;
use tally_core::validation::validate_window;
use tally_core::{Clock, CoreResult, Policy, Principal, Role};

#[derive(Debug, Clone)]
pub struct ReportService<R, C> {
    storage: R,
    clock: C,
    policy: Policy,
}

impl<R, C> ReportService<R, C>
where
    R: ReportStore,
    C: Clock,
{
    pub fn new(storage: R, clock: C, policy: Policy) -> Self {
        ReportService { storage, clock, policy }
    }

    pub async fn sales_report(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<SalesReport> {
        principal.require_role(Role::Cashier)?;
        validate_window(from, to)?;
        debug!(employee_id = %principal.employee_id, %from, %to, "Building sales report");

        let sales = self.storage.list_sales_between(from, to).await?;
        let returns = self.storage.list_returns_between(from, to).await?;
        Ok(summarize_sales(from, to, &sales, &returns))
    }

    pub async fn inventory_report(&self, principal: &Principal) -> CoreResult<InventoryReport> {
        principal.require_role(Role::Cashier)?;

        let items = self.storage.list_items().await?;
        Ok(summarize_inventory(&items, &self.policy))
    }

    /// Items ranked by units sold in the window. `limit` defaults to the
    /// policy's top-selling limit.
    pub async fn top_selling_items(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: Option<u32>,
    ) -> CoreResult<Vec<TopSellingItem>> {
        principal.require_role(Role::Admin)?;
        validate_window(from, to)?;

        let limit = limit.unwrap_or(self.policy.top_selling_limit) as usize;
        let sales = self.storage.list_sales_between(from, to).await?;
        Ok(top_selling(&sales, limit))
    }

    pub async fn employee_performance(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<EmployeePerformance>> {
        principal.require_role(Role::Admin)?;
        validate_window(from, to)?;

        let sales = self.storage.list_sales_between(from, to).await?;
        Ok(employee_performance(&sales))
    }

    /// Outstanding checkouts, with late fees accrued as of now.
    pub async fn rental_report(&self, principal: &Principal) -> CoreResult<RentalReport> {
        principal.require_role(Role::Admin)?;

        let outstanding = self.storage.list_outstanding_checkouts().await?;
        let assets = self.storage.list_rental_assets().await?;
        Ok(summarize_rentals(&outstanding, &assets, self.clock.now(), &self.policy))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::RentalService;
    use crate::returns::ReturnService;
    use crate::sale::SaleService;
    use crate::testing::{at, item, seeded_db};
    use chrono::Duration;
    use tally_core::{CartLine, CoreError, ErrorKind, FixedClock, RentalLine};
    use tally_db::Database;

    fn admin() -> Principal {
        Principal::new("A1001", Role::Admin)
    }

    fn cashier() -> Principal {
        Principal::new("C1001", Role::Cashier)
    }

    /// Two sales on March 15 (one by each employee), one return on the
    /// 16th, and a rental checked out on March 1.
    async fn activity() -> (Database, FixedClock) {
        let db = seeded_db().await;
        db.items().insert(&item("1002", 250, 40)).await.unwrap();
        let clock = FixedClock::new(at(2026, 3, 1, 10));

        RentalService::new(db.clone(), clock.clone(), Policy::default())
            .checkout_rental("5551234567", &[RentalLine::new("2001", 2)])
            .await
            .unwrap();

        clock.set(at(2026, 3, 15, 12));
        let sales = SaleService::new(db.clone(), clock.clone(), Policy::default());
        let first = sales
            .process_sale("A1001", &[CartLine::new("1001", 2)], None)
            .await
            .unwrap();
        sales
            .process_sale("C1001", &[CartLine::new("1002", 4), CartLine::new("1001", 1)], Some("SAVE10"))
            .await
            .unwrap();

        clock.set(at(2026, 3, 16, 9));
        ReturnService::new(db.clone(), clock.clone())
            .process_return(first.id, "1001", 1, None, "A1001")
            .await
            .unwrap();

        (db, clock)
    }

    fn service(db: &Database, clock: &FixedClock) -> ReportService<Database, FixedClock> {
        ReportService::new(db.clone(), clock.clone(), Policy::default())
    }

    #[tokio::test]
    async fn test_sales_report() {
        let (db, clock) = activity().await;
        let reports = service(&db, &clock);

        let report = reports
            .sales_report(&cashier(), at(2026, 3, 15, 0), at(2026, 3, 17, 0))
            .await
            .unwrap();

        // 2000 + 160 tax; (1000 + 1000) - 200 + 144 tax
        assert_eq!(report.sale_count, 2);
        assert_eq!(report.revenue_cents, 2160 + 1944);
        assert_eq!(report.tax_cents, 160 + 144);
        assert_eq!(report.discount_cents, 200);
        assert_eq!(report.refund_count, 1);
        assert_eq!(report.refund_cents, 1000);
        assert_eq!(report.net_revenue().cents(), 2160 + 1944 - 1000);

        // The return falls outside a window closing at the 16th
        let report = reports
            .sales_report(&admin(), at(2026, 3, 15, 0), at(2026, 3, 16, 0))
            .await
            .unwrap();
        assert_eq!(report.refund_count, 0);

        let err = reports
            .sales_report(&admin(), at(2026, 3, 16, 0), at(2026, 3, 15, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_inventory_report() {
        let (db, clock) = activity().await;
        let report = service(&db, &clock).inventory_report(&cashier()).await.unwrap();

        // 1001: 5 - 3 + 1 = 3 left; 1002: 36 left
        assert_eq!(report.item_count, 2);
        assert_eq!(report.total_units, 39);
        assert_eq!(report.stock_value_cents, 3 * 1000 + 36 * 250);
        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.critical_stock[0].item_id, "1001");
        assert!(report.out_of_stock.is_empty());
    }

    #[tokio::test]
    async fn test_admin_only_reports() {
        let (db, clock) = activity().await;
        let reports = service(&db, &clock);
        let (from, to) = (at(2026, 3, 1, 0), at(2026, 4, 1, 0));

        let err = reports.top_selling_items(&cashier(), from, to, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { required: Role::Admin }));
        assert!(reports.employee_performance(&cashier(), from, to).await.is_err());
        assert!(reports.rental_report(&cashier()).await.is_err());

        let top = reports.top_selling_items(&admin(), from, to, None).await.unwrap();
        assert_eq!(top[0].item_id, "1002");
        assert_eq!(top[0].units_sold, 4);
        assert_eq!(top[1].item_id, "1001");
        assert_eq!(top[1].units_sold, 3);

        let top = reports.top_selling_items(&admin(), from, to, Some(1)).await.unwrap();
        assert_eq!(top.len(), 1);

        let performance = reports.employee_performance(&admin(), from, to).await.unwrap();
        assert_eq!(performance.len(), 2);
        assert_eq!(performance[0].employee_id, "A1001");
        assert_eq!(performance[0].revenue_cents, 2160);
    }

    #[tokio::test]
    async fn test_rental_report_accrues_late_fees() {
        let (db, clock) = activity().await;
        let reports = service(&db, &clock);

        // Due March 15; on the 16th one day late
        let report = reports.rental_report(&admin()).await.unwrap();
        assert_eq!(report.outstanding_count, 1);
        assert_eq!(report.units_out, 2);
        assert_eq!(report.overdue.len(), 1);
        assert_eq!(report.overdue[0].days_late, 1);
        assert_eq!(report.accrued_late_fees_cents, 1000);

        clock.advance(Duration::days(2));
        let report = reports.rental_report(&admin()).await.unwrap();
        assert_eq!(report.accrued_late_fees_cents, 3000);
    }
}
