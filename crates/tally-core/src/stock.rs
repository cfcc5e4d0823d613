//! # Stock Ledger
//!
//! Reserve and release operations over item stock and rental availability.
//!
//! ## How Adjustments Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  read_item("1001") → StockItem { quantity: 5 }                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  reserve(&item, 2) → StockAdjustment { item_id: "1001", delta: -2 }    │
//! │        │              (pending, nothing written yet)                    │
//! │        ▼                                                                │
//! │  tx.apply_stock_adjustment(&adj, now) ← conditional delta, same         │
//! │        │                                transaction as the sale insert  │
//! │        ▼                                                                │
//! │  tx.commit()                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities are never set directly, only moved by signed deltas. The
//! check here runs against what was read; storage re-checks the floor at
//! write time so two concurrent reservations cannot both pass.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{RentalAsset, StockItem};

// =============================================================================
// Item Stock
// =============================================================================

/// A pending signed change to an item's on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub item_id: String,
    /// Negative for a reservation, positive for a release.
    pub delta: i64,
}

/// Prepares a reservation of `quantity` units of `item`.
///
/// ## Errors
/// `InsufficientStock` when `quantity` exceeds what is on hand.
pub fn reserve(item: &StockItem, quantity: i64) -> CoreResult<StockAdjustment> {
    if quantity > item.quantity {
        return Err(CoreError::InsufficientStock {
            item_id: item.item_id.clone(),
            available: item.quantity,
            requested: quantity,
        });
    }
    Ok(StockAdjustment {
        item_id: item.item_id.clone(),
        delta: -quantity,
    })
}

/// Prepares a release (restock) of `quantity` units.
pub fn release(item_id: &str, quantity: i64) -> StockAdjustment {
    StockAdjustment {
        item_id: item_id.to_string(),
        delta: quantity,
    }
}

// =============================================================================
// Rental Units
// =============================================================================

/// A pending signed change to a rental asset's available quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalAdjustment {
    pub rental_id: String,
    pub delta: i64,
}

/// Prepares a reservation of `quantity` rental units.
///
/// ## Errors
/// `RentalUnavailable` when `quantity` exceeds the available units.
pub fn reserve_rental_units(asset: &RentalAsset, quantity: i64) -> CoreResult<RentalAdjustment> {
    if quantity > asset.available_quantity {
        return Err(CoreError::RentalUnavailable {
            rental_id: asset.rental_id.clone(),
            available: asset.available_quantity,
            requested: quantity,
        });
    }
    Ok(RentalAdjustment {
        rental_id: asset.rental_id.clone(),
        delta: -quantity,
    })
}

/// Prepares a release of `quantity` rental units, capped so that
/// availability never exceeds the total owned.
///
/// Returns the adjustment and the number of units dropped by the cap
/// (non-zero only when more units come back than are checked out).
pub fn release_rental_units(asset: &RentalAsset, quantity: i64) -> (RentalAdjustment, i64) {
    let room = asset.checked_out().max(0);
    let delta = quantity.min(room);
    (
        RentalAdjustment {
            rental_id: asset.rental_id.clone(),
            delta,
        },
        quantity - delta,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(quantity: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            item_id: "1001".to_string(),
            name: "Widget".to_string(),
            price_cents: 1000,
            quantity,
            category: "General".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn asset(total: i64, available: i64) -> RentalAsset {
        let now = Utc::now();
        RentalAsset {
            rental_id: "2001".to_string(),
            name: "Projector".to_string(),
            price_per_day_cents: 5000,
            total_quantity: total,
            available_quantity: available,
            category: "AV".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reserve_within_stock() {
        let adj = reserve(&item(5), 5).unwrap();
        assert_eq!(adj.delta, -5);
        assert_eq!(adj.item_id, "1001");
    }

    #[test]
    fn test_reserve_insufficient() {
        let err = reserve(&item(3), 4).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
    }

    #[test]
    fn test_release() {
        assert_eq!(release("1001", 2).delta, 2);
    }

    #[test]
    fn test_reserve_rental_units() {
        assert_eq!(reserve_rental_units(&asset(5, 5), 1).unwrap().delta, -1);
        assert!(matches!(
            reserve_rental_units(&asset(5, 1), 2),
            Err(CoreError::RentalUnavailable { available: 1, requested: 2, .. })
        ));
    }

    #[test]
    fn test_release_rental_units_capped_at_total() {
        let (adj, dropped) = release_rental_units(&asset(5, 4), 1);
        assert_eq!((adj.delta, dropped), (1, 0));

        let (adj, dropped) = release_rental_units(&asset(5, 4), 3);
        assert_eq!((adj.delta, dropped), (1, 2));

        let (adj, dropped) = release_rental_units(&asset(5, 5), 1);
        assert_eq!((adj.delta, dropped), (0, 1));
    }
}
