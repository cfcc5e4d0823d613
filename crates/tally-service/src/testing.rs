//! Shared fixtures for the pipeline tests: an in-memory SQLite database
//! seeded with one item, one rental asset and one coupon.

use chrono::{DateTime, TimeZone, Utc};
use tally_core::{Coupon, DiscountKind, RentalAsset, StockItem};
use tally_db::{Database, DbConfig};

pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub(crate) fn item(item_id: &str, price_cents: i64, quantity: i64) -> StockItem {
    let now = Utc::now();
    StockItem {
        item_id: item_id.to_string(),
        name: format!("Item {item_id}"),
        price_cents,
        quantity,
        category: "General".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn asset(rental_id: &str, price_per_day_cents: i64, total: i64) -> RentalAsset {
    let now = Utc::now();
    RentalAsset {
        rental_id: rental_id.to_string(),
        name: format!("Rental {rental_id}"),
        price_per_day_cents,
        total_quantity: total,
        available_quantity: total,
        category: "General".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn coupon(code: &str, kind: DiscountKind, value: i64) -> Coupon {
    Coupon {
        code: code.to_string(),
        discount_kind: kind,
        discount_value: value,
        min_purchase_cents: 0,
        max_discount_cents: None,
        expiration_date: None,
        usage_limit: 0,
        usage_count: 0,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Item `1001` at $10.00 × 5, rental `2001` at $50.00/day × 5, coupon
/// `SAVE10` (10%, no minimum).
pub(crate) async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.items().insert(&item("1001", 1000, 5)).await.unwrap();
    db.rentals().insert(&asset("2001", 5000, 5)).await.unwrap();
    db.coupons()
        .insert(&coupon("SAVE10", DiscountKind::Percentage, 1000))
        .await
        .unwrap();
    db
}
