//! # tally-core: Pure Business Logic for the Tally Back Office
//!
//! This crate holds every rule the back office enforces, as pure functions
//! and plain data, plus the capability traits the pipelines are written
//! against. It performs no I/O of its own.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              API layer (external, not in this workspace)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │  tally-service: SaleService, ReturnService, RentalService, ...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ generic over Storage + Clock           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  stock  │ │ coupon  │ │ pricing │ │ rental  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐              │   │
//! │  │   │  store  │ │  clock  │ │  auth   │ │ report  │              │   │
//! │  │   │ (traits)│ │ (trait) │ │ (trait) │ │         │              │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ implemented by                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tally-db (SQLite backend)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and half-up rounding
//! - [`types`] - Domain entities (StockItem, RentalAsset, Coupon, Sale, ...)
//! - [`error`] - Error taxonomy and [`ErrorKind`]
//! - [`validation`] - Input validation (phone numbers, quantities, codes)
//! - [`stock`] - Stock ledger: reserve/release adjustments
//! - [`coupon`] - Coupon eligibility and discount computation
//! - [`cart`] - Cart line normalization
//! - [`pricing`] - Sale line pricing and totals
//! - [`rental`] - Due dates, days late, late fees
//! - [`policy`] - Configurable numeric policy
//! - [`clock`], [`auth`], [`store`] - Capabilities consumed by the pipelines
//! - [`report`] - Report aggregation over committed data
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::Rate;
//!
//! let subtotal = Money::from_cents(2000); // $20.00
//! let tax = subtotal.apply_rate(Rate::from_bps(800)); // 8%
//! assert_eq!(tax.cents(), 160);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cart;
pub mod clock;
pub mod coupon;
pub mod error;
pub mod money;
pub mod policy;
pub mod pricing;
pub mod rental;
pub mod report;
pub mod stock;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{Authenticator, Credentials, Principal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use policy::{CouponPolicy, Policy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Upper bound on a single request line's quantity. Keeps
/// `price × quantity` inside `i64`; stock is the real limit.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000_000;

/// Maximum length of a normalized coupon code.
pub const MAX_COUPON_CODE_LEN: usize = 20;

/// Reason stored on a sale return when the caller gives none.
pub const DEFAULT_RETURN_REASON: &str = "No reason provided";
