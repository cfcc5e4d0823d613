//! # Seed Data Generator
//!
//! Populates a back office database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - Sale items `1001..` across a few categories, varied price and stock
//! - Rental assets `2001..`
//! - Coupons `SAVE10` (10% off) and `FLAT5` ($5 off orders over $25)
//! - Employees `A1001` (Admin) and `C1001` (Cashier)

use chrono::Utc;
use std::env;
use tally_core::{Coupon, DiscountKind, Employee, RentalAsset, Role, StockItem};
use tally_db::{hash_password, Database, DbConfig};

/// (category, names)
const ITEMS: &[(&str, &[&str])] = &[
    ("Stationery", &["Ballpoint Pen", "Spiral Notebook", "Sticky Notes", "Highlighter", "Stapler"]),
    ("Snacks", &["Trail Mix", "Granola Bar", "Potato Chips", "Dark Chocolate", "Pretzels"]),
    ("Electronics", &["USB-C Cable", "AA Batteries", "Earbuds", "Phone Charger", "Flash Drive"]),
];

/// (name, category, price per day in cents, units owned)
const RENTALS: &[(&str, &str, i64, i64)] = &[
    ("Projector", "AV", 5000, 3),
    ("PA Speaker", "AV", 3500, 2),
    ("Folding Table", "Furniture", 800, 20),
    ("Pressure Washer", "Tools", 4500, 2),
    ("Carpet Cleaner", "Tools", 3000, 4),
];

const DEMO_ADMIN_PASSWORD: &str = "admin123";
const DEMO_CASHIER_PASSWORD: &str = "cashier123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Back Office Seed Data Generator");
    println!("========================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Items
    println!();
    println!("Generating items...");
    let mut seq = 0usize;
    for (category, names) in ITEMS {
        for name in names.iter() {
            let item = StockItem {
                item_id: (1001 + seq).to_string(),
                name: name.to_string(),
                price_cents: 199 + ((seq * 137) % 1800) as i64,
                quantity: 5 + ((seq * 7) % 40) as i64,
                category: category.to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            if let Err(e) = db.items().insert(&item).await {
                eprintln!("Failed to insert item {}: {}", item.item_id, e);
                continue;
            }
            seq += 1;
        }
    }
    println!("✓ {} items", seq);

    // Rentals
    for (idx, (name, category, price_per_day_cents, total)) in RENTALS.iter().enumerate() {
        let asset = RentalAsset {
            rental_id: (2001 + idx).to_string(),
            name: name.to_string(),
            price_per_day_cents: *price_per_day_cents,
            total_quantity: *total,
            available_quantity: *total,
            category: category.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = db.rentals().insert(&asset).await {
            eprintln!("Failed to insert rental {}: {}", asset.rental_id, e);
        }
    }
    println!("✓ {} rental assets", RENTALS.len());

    // Coupons
    let coupons = [
        Coupon {
            code: "SAVE10".to_string(),
            discount_kind: DiscountKind::Percentage,
            discount_value: 1000,
            min_purchase_cents: 0,
            max_discount_cents: None,
            expiration_date: None,
            usage_limit: 0,
            usage_count: 0,
            is_active: true,
            created_at: now,
        },
        Coupon {
            code: "FLAT5".to_string(),
            discount_kind: DiscountKind::Fixed,
            discount_value: 500,
            min_purchase_cents: 2500,
            max_discount_cents: None,
            expiration_date: None,
            usage_limit: 100,
            usage_count: 0,
            is_active: true,
            created_at: now,
        },
    ];
    for coupon in &coupons {
        db.coupons().insert(coupon).await?;
    }
    println!("✓ {} coupons", coupons.len());

    // Employees
    for (employee_id, role, first_name, password) in [
        ("A1001", Role::Admin, "Avery", DEMO_ADMIN_PASSWORD),
        ("C1001", Role::Cashier, "Casey", DEMO_CASHIER_PASSWORD),
    ] {
        let employee = Employee {
            employee_id: employee_id.to_string(),
            role,
            first_name: first_name.to_string(),
            last_name: "Demo".to_string(),
            contact_number: None,
            email: None,
            password_hash: hash_password(password)?,
            is_active: true,
            created_at: now,
        };
        db.employees().insert(&employee).await?;
        println!("✓ Employee {} ({}) password: {}", employee_id, role, password);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
