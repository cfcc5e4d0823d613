//! # Sale Pipeline
//!
//! Turns a cart and an optional coupon into a committed sale.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  normalize_cart            EmptyCart / InvalidQuantity (nothing opened) │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐   │
//! │       │                                                             │   │
//! │  per line: read_item → reserve → price_line                         │   │
//! │       │          ItemNotFound / InsufficientStock                   │   │
//! │       ▼                                                             │   │
//! │  subtotal = Σ line_total                                            │   │
//! │       │                                                             │   │
//! │  coupon? → validate_coupon → claim one use (guarded increment)      │   │
//! │       │      Lenient: rejection → warn, no discount                 │   │
//! │       │      Strict:  rejection → abort                             │   │
//! │       ▼                                                             │   │
//! │  compute_totals (taxable, tax, total)                               │   │
//! │       │                                                             │   │
//! │  apply stock deltas → insert sale + lines                           │   │
//! │       │                                                             │   │
//! │  COMMIT ────────────────────────────────────────────────────────────┘   │
//! │       │   any error before this point: tx dropped, nothing written     │
//! │       ▼                                                                 │
//! │  Sale (receipt)                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check on read is repeated by the conditional decrement at
//! write time, which is what keeps concurrent sales from overselling.

use tracing::{debug, info, warn};

use crate::coupon::validate_coupon;
use tally_core::cart::normalize_cart;
use tally_core::coupon::CouponApplication;
use tally_core::pricing::{build_sale, compute_totals, price_line, subtotal};
use tally_core::stock::reserve;
use tally_core::store::{CouponStore, ItemStore, SaleStore, Storage, Transaction};
use tally_core::validation::validate_identifier;
use tally_core::{CartLine, Clock, CoreError, CoreResult, CouponPolicy, Money, Policy, Sale, SaleHistory};

/// The sale pipeline.
#[derive(Debug, Clone)]
pub struct SaleService<S, C> {
    storage: S,
    clock: C,
    policy: Policy,
}

impl<S, C> SaleService<S, C>
where
    S: Storage,
    C: Clock,
{
    pub fn new(storage: S, clock: C, policy: Policy) -> Self {
        SaleService { storage, clock, policy }
    }

    /// Processes a sale for an authenticated employee.
    ///
    /// Returns the committed sale with its assigned id and lines. On any
    /// error nothing is written: no stock moves, no sale row, no coupon use.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let sale = sales
    ///     .process_sale("C1001", &[CartLine::new("1001", 2)], Some("SAVE10"))
    ///     .await?;
    /// assert_eq!(sale.total().to_string(), "$19.44");
    /// ```
    pub async fn process_sale(
        &self,
        employee_id: &str,
        cart: &[CartLine],
        coupon_code: Option<&str>,
    ) -> CoreResult<Sale> {
        validate_identifier("employee_id", employee_id)?;
        let lines = normalize_cart(cart)?;
        let now = self.clock.now();

        debug!(employee_id = %employee_id, lines = lines.len(), "Processing sale");

        let mut tx = self.storage.begin().await?;

        // Read, reserve and price every line before writing anything
        let mut priced = Vec::with_capacity(lines.len());
        let mut adjustments = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = tx
                .read_item(&line.item_id)
                .await?
                .filter(|item| item.is_active)
                .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;

            adjustments.push(reserve(&item, line.quantity)?);
            priced.push(price_line(&item, line.quantity));
        }

        let subtotal = subtotal(&priced);

        let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => self.apply_coupon(&mut tx, code, subtotal).await?,
            None => None,
        };
        let discount = coupon.as_ref().map(CouponApplication::discount).unwrap_or_default();

        let totals = compute_totals(subtotal, discount, self.policy.tax_rate);
        let mut sale = build_sale(employee_id, &priced, &totals, coupon.as_ref(), now);

        for adjustment in &adjustments {
            tx.apply_stock_adjustment(adjustment, now).await?;
        }
        let sale_id = tx.insert_sale(&sale).await?;

        tx.commit().await?;

        sale.id = sale_id;
        for line in &mut sale.lines {
            line.sale_id = sale_id;
        }

        info!(
            sale_id = sale_id,
            employee_id = %employee_id,
            subtotal = %sale.subtotal(),
            discount = %sale.discount(),
            tax = %sale.tax(),
            total = %sale.total(),
            coupon = sale.coupon_code.as_deref().unwrap_or("-"),
            "Sale committed"
        );

        Ok(sale)
    }

    /// Looks up a committed sale with its lines and returns.
    pub async fn get_sale(&self, sale_id: i64) -> CoreResult<SaleHistory> {
        let mut tx = self.storage.begin().await?;
        let sale = tx.read_sale(sale_id).await?.ok_or(CoreError::SaleNotFound(sale_id))?;
        let returns = tx.read_returns(sale_id).await?;
        Ok(SaleHistory { sale, returns })
    }

    /// Validates the coupon and claims one use of it, applying the
    /// configured policy to rejections. The claim lands only if the sale
    /// commits.
    async fn apply_coupon(
        &self,
        tx: &mut S::Tx,
        code: &str,
        subtotal: Money,
    ) -> CoreResult<Option<CouponApplication>> {
        let claimed = match validate_coupon(&mut *tx, code, subtotal, self.clock.today()).await {
            Ok(application) => tx
                .increment_coupon_usage(&application.code)
                .await
                .map(|()| application),
            Err(err) => Err(err),
        };

        match claimed {
            Ok(application) => Ok(Some(application)),
            Err(err) if err.is_coupon_rejection() && self.policy.coupon_policy == CouponPolicy::Lenient => {
                warn!(code = %code, reason = %err, "Coupon rejected, selling at full price");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
