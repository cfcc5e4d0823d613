//! # Return Flow
//!
//! Refunds part or all of a sale line and puts the units back on the
//! shelf.
//!
//! ```text
//! read_sale ──► line_for(item) ──► already returned + qty ≤ purchased?
//!     │               │                        │
//! SaleNotFound  LineItemNotFound     ExcessiveReturnQuantity
//!                                              │
//!                                              ▼
//!                 refund = unit price at sale × qty   (no tax / discount share)
//!                                              │
//!                     restock (+qty) + insert return row, one transaction
//! ```

use tracing::{debug, info};

use tally_core::stock::release;
use tally_core::store::{ItemStore, SaleStore, Storage, Transaction};
use tally_core::validation::{normalize_reason, validate_identifier, validate_quantity};
use tally_core::{Clock, CoreError, CoreResult, ReturnReceipt, SaleReturn};

/// The return pipeline.
#[derive(Debug, Clone)]
pub struct ReturnService<S, C> {
    storage: S,
    clock: C,
}

impl<S, C> ReturnService<S, C>
where
    S: Storage,
    C: Clock,
{
    pub fn new(storage: S, clock: C) -> Self {
        ReturnService { storage, clock }
    }

    /// Returns `quantity` units of `item_id` from sale `sale_id`.
    ///
    /// Repeated returns against the same line are allowed until the
    /// purchased quantity is used up. A blank reason is recorded as
    /// [`tally_core::DEFAULT_RETURN_REASON`].
    pub async fn process_return(
        &self,
        sale_id: i64,
        item_id: &str,
        quantity: i64,
        reason: Option<&str>,
        employee_id: &str,
    ) -> CoreResult<ReturnReceipt> {
        validate_quantity(quantity)?;
        validate_identifier("item_id", item_id)?;
        validate_identifier("employee_id", employee_id)?;
        let item_id = item_id.trim();
        let reason = normalize_reason(reason);
        let now = self.clock.now();

        debug!(sale_id = sale_id, item_id = %item_id, quantity = quantity, "Processing return");

        let mut tx = self.storage.begin().await?;

        let sale = tx.read_sale(sale_id).await?.ok_or(CoreError::SaleNotFound(sale_id))?;
        let line = sale.line_for(item_id).ok_or_else(|| CoreError::LineItemNotFound {
            sale_id,
            item_id: item_id.to_string(),
        })?;

        let already_returned = tx.returned_quantity(sale_id, item_id).await?;
        if already_returned + quantity > line.quantity {
            return Err(CoreError::ExcessiveReturnQuantity {
                item_id: item_id.to_string(),
                purchased: line.quantity,
                already_returned,
                requested: quantity,
            });
        }

        let refund = line.unit_price().multiply_quantity(quantity);

        // Name as of the return; the sale line keeps the name as sold
        let item_name = tx
            .read_item(item_id)
            .await?
            .map(|item| item.name)
            .unwrap_or_else(|| line.item_name.clone());

        tx.apply_stock_adjustment(&release(item_id, quantity), now).await?;

        let mut record = SaleReturn {
            id: 0,
            sale_id,
            item_id: item_id.to_string(),
            item_name,
            quantity,
            refund_cents: refund.cents(),
            reason,
            employee_id: employee_id.to_string(),
            returned_at: now,
        };
        record.id = tx.insert_return(&record).await?;

        tx.commit().await?;

        info!(
            return_id = record.id,
            sale_id = sale_id,
            item_id = %item_id,
            quantity = quantity,
            refund = %refund,
            "Return committed"
        );

        Ok(ReturnReceipt {
            refund_cents: refund.cents(),
            record,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::SaleService;
    use crate::testing::{at, seeded_db};
    use tally_core::{CartLine, ErrorKind, FixedClock, Policy, DEFAULT_RETURN_REASON};
    use tally_db::Database;

    struct Fixture {
        db: Database,
        returns: ReturnService<Database, FixedClock>,
        sale_id: i64,
    }

    /// Sells 3 of item 1001 with SAVE10 (5 on hand → 2 left).
    async fn fixture() -> Fixture {
        let db = seeded_db().await;
        let clock = FixedClock::new(at(2026, 3, 15, 12));
        let sales = SaleService::new(db.clone(), clock.clone(), Policy::default());
        let sale = sales
            .process_sale("E1", &[CartLine::new("1001", 3)], Some("SAVE10"))
            .await
            .unwrap();
        clock.set(at(2026, 3, 16, 9));
        Fixture {
            returns: ReturnService::new(db.clone(), clock),
            db,
            sale_id: sale.id,
        }
    }

    async fn stock_of(db: &Database) -> i64 {
        db.items().get_by_id("1001").await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_flat_refund_and_restock() {
        let f = fixture().await;
        assert_eq!(stock_of(&f.db).await, 2);

        let receipt = f
            .returns
            .process_return(f.sale_id, "1001", 2, Some("Damaged box"), "E2")
            .await
            .unwrap();

        // Unit price × qty, ignoring the coupon and tax on the sale
        assert_eq!(receipt.refund_cents, 2000);
        assert_eq!(receipt.record.refund_cents, 2000);
        assert!(receipt.record.id > 0);
        assert_eq!(receipt.record.reason, "Damaged box");
        assert_eq!(receipt.record.employee_id, "E2");
        assert_eq!(receipt.record.item_name, "Item 1001");
        assert_eq!(receipt.record.returned_at, at(2026, 3, 16, 9));
        assert_eq!(stock_of(&f.db).await, 4);
    }

    #[tokio::test]
    async fn test_cumulative_returns_bounded_by_purchase() {
        let f = fixture().await;

        f.returns.process_return(f.sale_id, "1001", 2, None, "E1").await.unwrap();

        let err = f
            .returns
            .process_return(f.sale_id, "1001", 2, None, "E1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExcessiveReturnQuantity { purchased: 3, already_returned: 2, requested: 2, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(stock_of(&f.db).await, 4);

        let last = f.returns.process_return(f.sale_id, "1001", 1, None, "E1").await.unwrap();
        assert_eq!(last.record.reason, DEFAULT_RETURN_REASON);
        assert_eq!(stock_of(&f.db).await, 5);
    }

    #[tokio::test]
    async fn test_over_return_performs_no_mutation() {
        let f = fixture().await;

        let err = f
            .returns
            .process_return(f.sale_id, "1001", 4, None, "E1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ExcessiveReturnQuantity { purchased: 3, .. }));
        assert_eq!(stock_of(&f.db).await, 2);
        assert!(f.db.sales().returns_for(f.sale_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_cases() {
        let f = fixture().await;

        assert!(matches!(
            f.returns.process_return(999, "1001", 1, None, "E1").await,
            Err(CoreError::SaleNotFound(999))
        ));
        assert!(matches!(
            f.returns.process_return(f.sale_id, "1002", 1, None, "E1").await,
            Err(CoreError::LineItemNotFound { .. })
        ));
        assert!(matches!(
            f.returns.process_return(f.sale_id, "1001", 0, None, "E1").await,
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_sale_history_lists_returns() {
        let f = fixture().await;
        f.returns.process_return(f.sale_id, "1001", 1, None, "E1").await.unwrap();

        let sales = SaleService::new(f.db.clone(), FixedClock::new(at(2026, 3, 17, 9)), Policy::default());
        let history = sales.get_sale(f.sale_id).await.unwrap();
        assert_eq!(history.returns.len(), 1);
        assert_eq!(history.refunded().cents(), 1000);
    }
}
