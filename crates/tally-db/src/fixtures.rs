//! Test fixtures shared by the repository and transaction tests.

use chrono::Utc;
use tally_core::{Coupon, DiscountKind, Employee, RentalAsset, Role, StockItem};

pub(crate) fn sample_item(item_id: &str, price_cents: i64, quantity: i64) -> StockItem {
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

/// A fully available rental asset.
pub(crate) fn sample_asset(rental_id: &str, price_per_day_cents: i64, total: i64) -> RentalAsset {
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

/// Active, unlimited, no minimum, no cap, never expires.
pub(crate) fn sample_coupon(code: &str, kind: DiscountKind, value: i64) -> Coupon {
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

pub(crate) fn sample_employee(employee_id: &str, role: Role, password_hash: &str) -> Employee {
    Employee {
        employee_id: employee_id.to_string(),
        role,
        first_name: "Test".to_string(),
        last_name: employee_id.to_string(),
        contact_number: None,
        email: None,
        password_hash: password_hash.to_string(),
        is_active: true,
        created_at: Utc::now(),
    }
}
