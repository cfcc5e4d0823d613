//! # Reports
//!
//! Aggregations over committed sales, returns, stock and rentals. The
//! listings come from a [`crate::store::ReportStore`]; the math is here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::policy::Policy;
use crate::rental::{days_late, late_fee};
use crate::types::{RentalAsset, RentalCheckout, Sale, SaleReturn, StockItem};

// =============================================================================
// Sales
// =============================================================================

/// Sales summary over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub refund_count: i64,
    pub refund_cents: i64,
}

impl SalesReport {
    /// Revenue less refunds.
    pub fn net_revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents - self.refund_cents)
    }
}

pub fn summarize_sales(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    sales: &[Sale],
    returns: &[SaleReturn],
) -> SalesReport {
    SalesReport {
        from,
        to,
        sale_count: sales.len() as i64,
        revenue_cents: sales.iter().map(|s| s.total_cents).sum(),
        tax_cents: sales.iter().map(|s| s.tax_cents).sum(),
        discount_cents: sales.iter().map(|s| s.discount_cents).sum(),
        refund_count: returns.len() as i64,
        refund_cents: returns.iter().map(|r| r.refund_cents).sum(),
    }
}

/// An item ranked by units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopSellingItem {
    pub item_id: String,
    pub item_name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Ranks items by units sold (ties broken by revenue, then id).
pub fn top_selling(sales: &[Sale], limit: usize) -> Vec<TopSellingItem> {
    let mut by_item: HashMap<&str, TopSellingItem> = HashMap::new();
    for line in sales.iter().flat_map(|s| s.lines.iter()) {
        let entry = by_item.entry(line.item_id.as_str()).or_insert_with(|| TopSellingItem {
            item_id: line.item_id.clone(),
            item_name: line.item_name.clone(),
            units_sold: 0,
            revenue_cents: 0,
        });
        entry.units_sold += line.quantity;
        entry.revenue_cents += line.line_total_cents;
    }

    let mut ranked: Vec<TopSellingItem> = by_item.into_values().collect();
    ranked.sort_by(|a, b| {
        b.units_sold
            .cmp(&a.units_sold)
            .then(b.revenue_cents.cmp(&a.revenue_cents))
            .then(a.item_id.cmp(&b.item_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Sales volume per employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeePerformance {
    pub employee_id: String,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

/// Per-employee totals, highest revenue first.
pub fn employee_performance(sales: &[Sale]) -> Vec<EmployeePerformance> {
    let mut by_employee: HashMap<&str, EmployeePerformance> = HashMap::new();
    for sale in sales {
        let entry = by_employee
            .entry(sale.employee_id.as_str())
            .or_insert_with(|| EmployeePerformance {
                employee_id: sale.employee_id.clone(),
                sale_count: 0,
                revenue_cents: 0,
            });
        entry.sale_count += 1;
        entry.revenue_cents += sale.total_cents;
    }

    let mut rows: Vec<EmployeePerformance> = by_employee.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then(a.employee_id.cmp(&b.employee_id))
    });
    rows
}

// =============================================================================
// Inventory
// =============================================================================

/// A stock level snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryReport {
    pub item_count: i64,
    pub total_units: i64,
    pub stock_value_cents: i64,
    /// Quantity ≤ low-stock threshold (includes critical and out of stock).
    pub low_stock: Vec<StockItem>,
    /// Quantity ≤ critical threshold (includes out of stock).
    pub critical_stock: Vec<StockItem>,
    pub out_of_stock: Vec<StockItem>,
}

pub fn summarize_inventory(items: &[StockItem], policy: &Policy) -> InventoryReport {
    let pick = |pred: &dyn Fn(&StockItem) -> bool| -> Vec<StockItem> {
        let mut picked: Vec<StockItem> = items.iter().filter(|i| pred(i)).cloned().collect();
        picked.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.item_id.cmp(&b.item_id)));
        picked
    };

    InventoryReport {
        item_count: items.len() as i64,
        total_units: items.iter().map(|i| i.quantity).sum(),
        stock_value_cents: items.iter().map(StockItem::stock_value).sum::<Money>().cents(),
        low_stock: pick(&|i| i.quantity <= policy.low_stock_threshold),
        critical_stock: pick(&|i| i.quantity <= policy.critical_stock_threshold),
        out_of_stock: pick(&|i| i.quantity == 0),
    }
}

// =============================================================================
// Rentals
// =============================================================================

/// An outstanding checkout past its due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverdueRental {
    pub checkout: RentalCheckout,
    pub days_late: i64,
    /// Late fee if returned at the report's instant.
    pub accrued_late_fee_cents: i64,
}

/// Outstanding rentals and what is overdue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalReport {
    #[ts(as = "String")]
    pub as_of: DateTime<Utc>,
    pub outstanding_count: i64,
    pub units_out: i64,
    pub overdue: Vec<OverdueRental>,
    pub accrued_late_fees_cents: i64,
}

pub fn summarize_rentals(
    outstanding: &[RentalCheckout],
    assets: &[RentalAsset],
    now: DateTime<Utc>,
    policy: &Policy,
) -> RentalReport {
    let prices: HashMap<&str, Money> = assets
        .iter()
        .map(|a| (a.rental_id.as_str(), a.price_per_day()))
        .collect();

    let overdue: Vec<OverdueRental> = outstanding
        .iter()
        .filter_map(|c| {
            let days = days_late(c.due_date, now);
            if days == 0 {
                return None;
            }
            let price = prices.get(c.rental_id.as_str()).copied().unwrap_or_default();
            Some(OverdueRental {
                checkout: c.clone(),
                days_late: days,
                accrued_late_fee_cents: late_fee(price, c.quantity, policy.late_fee_rate, days).cents(),
            })
        })
        .collect();

    RentalReport {
        as_of: now,
        outstanding_count: outstanding.len() as i64,
        units_out: outstanding.iter().map(|c| c.quantity).sum(),
        accrued_late_fees_cents: overdue.iter().map(|o| o.accrued_late_fee_cents).sum(),
        overdue,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
