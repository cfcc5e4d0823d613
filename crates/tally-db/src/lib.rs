//! # tally-db: SQLite Storage for Tally Back Office
//!
//! Implements the storage and authentication capabilities from
//! `tally-core` on SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  tally-service (SaleService, RentalService, ReportService, ...)        │
//! │       │  generic over Storage / ReportStore / Authenticator            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │ SqliteTrans-  │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │───►│ action        │    │  (embedded)  │   │   │
//! │  │   │               │    │ (store impls) │    │              │   │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘   │   │
//! │  │           │                    │                                │   │
//! │  │           ▼                    ▼                                │   │
//! │  │   ┌─────────────────────────────────────┐  ┌──────────────┐    │   │
//! │  │   │ repository/ item rental coupon sale │  │ auth.rs      │    │   │
//! │  │   │            employee                 │  │ argon2       │    │   │
//! │  │   └─────────────────────────────────────┘  └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! db.items().insert(&item).await?;
//!
//! // Database implements Storage + ReportStore
//! let sales = SaleService::new(db.clone(), SystemClock, Policy::default());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

#[cfg(test)]
pub(crate) mod fixtures;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{hash_password, PasswordAuthenticator};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use transaction::SqliteTransaction;

// Repository re-exports for convenience
pub use repository::coupon::CouponRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::item::ItemRepository;
pub use repository::rental::RentalRepository;
pub use repository::sale::SaleRepository;
