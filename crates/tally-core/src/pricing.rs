//! # Sale Pricing
//!
//! Line pricing and totals for the sale pipeline.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_total   = unit_price × quantity            (exact in cents)      │
//! │  subtotal     = Σ line_total                                           │
//! │  discount     = coupon discount (0 when none applied)                  │
//! │  taxable      = subtotal − discount                                    │
//! │  tax          = round_half_up(taxable × tax_rate)                      │
//! │  total        = taxable + tax                                          │
//! │                                                                         │
//! │  Example: 2 × $10.00, SAVE10 (10%), 8% tax                             │
//! │    subtotal 20.00 → discount 2.00 → taxable 18.00                      │
//! │    → tax 1.44 → total 19.44                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coupon::CouponApplication;
use crate::money::Money;
use crate::types::{Rate, Sale, SaleLineItem, StockItem};

/// A cart line priced against the item as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub item_id: String,
    /// Name snapshot.
    pub item_name: String,
    pub quantity: i64,
    /// Price snapshot.
    pub unit_price: Money,
    pub line_total: Money,
}

/// Prices one line.
pub fn price_line(item: &StockItem, quantity: i64) -> PricedLine {
    PricedLine {
        item_id: item.item_id.clone(),
        item_name: item.name.clone(),
        quantity,
        unit_price: item.price(),
        line_total: item.price().multiply_quantity(quantity),
    }
}

/// Sum of line totals.
pub fn subtotal(lines: &[PricedLine]) -> Money {
    lines.iter().map(|l| l.line_total).sum()
}

/// Money figures of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

/// Computes taxable amount, tax and total.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::compute_totals;
/// use tally_core::types::Rate;
///
/// let t = compute_totals(Money::from_cents(2000), Money::zero(), Rate::from_bps(800));
/// assert_eq!(t.tax.cents(), 160);
/// assert_eq!(t.total.cents(), 2160);
/// ```
pub fn compute_totals(subtotal: Money, discount: Money, tax_rate: Rate) -> SaleTotals {
    let discount = discount.min(subtotal).non_negative();
    let taxable = subtotal - discount;
    let tax = taxable.apply_rate(tax_rate);
    SaleTotals {
        subtotal,
        discount,
        taxable,
        tax,
        total: taxable + tax,
    }
}

/// Assembles the sale row to persist. `id` and line `sale_id`s are 0
/// until storage assigns them.
pub fn build_sale(
    employee_id: &str,
    lines: &[PricedLine],
    totals: &SaleTotals,
    coupon: Option<&CouponApplication>,
    now: DateTime<Utc>,
) -> Sale {
    Sale {
        id: 0,
        employee_id: employee_id.to_string(),
        subtotal_cents: totals.subtotal.cents(),
        discount_cents: totals.discount.cents(),
        tax_cents: totals.tax.cents(),
        total_cents: totals.total.cents(),
        coupon_code: coupon.map(|c| c.code.clone()),
        created_at: now,
        lines: lines
            .iter()
            .map(|l| SaleLineItem {
                sale_id: 0,
                item_id: l.item_id.clone(),
                item_name: l.item_name.clone(),
                quantity: l.quantity,
                unit_price_cents: l.unit_price.cents(),
                line_total_cents: l.line_total.cents(),
            })
            .collect(),
    }
}

/// Checks `total == (subtotal − discount) + round(tax)` and
/// `subtotal == Σ line_total` for a stored sale.
pub fn totals_consistent(sale: &Sale, tax_rate: Rate) -> bool {
    let lines: Money = sale.lines.iter().map(SaleLineItem::line_total).sum();
    let expected = compute_totals(sale.subtotal(), sale.discount(), tax_rate);
    lines == sale.subtotal() && expected.tax == sale.tax() && expected.total == sale.total()
}

// =============================================================================
// Unit Tests
// =============================================================================
