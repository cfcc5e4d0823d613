//! # Repository Module
//!
//! SQL for each table group, in two layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pub(crate) fn fetch_x(&mut SqliteConnection, ..)                       │
//! │      Shared statements. Run on a pooled connection or inside a         │
//! │      SqliteTransaction (the pipelines' path).                          │
//! │                                                                         │
//! │  XRepository { pool }                                                  │
//! │      Administration and lookups outside a pipeline: inserts,           │
//! │      deactivation, history, counts.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Stock items
//! - [`rental::RentalRepository`] - Rental assets, customers, checkouts
//! - [`coupon::CouponRepository`] - Coupon definitions
//! - [`sale::SaleRepository`] - Sales, lines, returns
//! - [`employee::EmployeeRepository`] - Employees and password hashes

pub mod coupon;
pub mod employee;
pub mod item;
pub mod rental;
pub mod sale;
