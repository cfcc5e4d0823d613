//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - One variant per pipeline failure               │
//! │  ├── ValidationError  - Field-level input validation failures          │
//! │  └── ErrorKind        - Taxonomy an API layer maps to responses        │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, folded into                 │
//! │                         CoreError::Persistence at the store boundary   │
//! │                                                                         │
//! │  Kinds:                                                                │
//! │    Validation   empty cart, bad quantity, malformed phone              │
//! │    NotFound     item / rental / sale / coupon / line item absent       │
//! │    Conflict     stock, availability, coupon state, return quantity     │
//! │    Unauthorized bad credentials, insufficient role                     │
//! │    Persistence  commit failure, retryable by the caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::Role;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorKind {
    /// Bad input, reported before any state is touched.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Current state does not allow the operation.
    Conflict,
    /// Credentials or role check failed.
    Unauthorized,
    /// Storage failed; nothing was written.
    Persistence,
}

impl ErrorKind {
    /// Only persistence failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Persistence)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and pipeline failures.
#[derive(Debug, Error)]
pub enum CoreError {
    // -- Validation ----------------------------------------------------------
    /// Sale requested with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Line quantity below 1 or above the per-line maximum.
    #[error("Invalid quantity {quantity}: must be between 1 and {max}")]
    InvalidQuantity { quantity: i64, max: i64 },

    /// Customer phone is not exactly ten digits.
    #[error("Invalid phone number '{0}': must be exactly 10 digits")]
    InvalidPhoneNumber(String),

    /// Rental checkout requested with no lines.
    #[error("No rental items requested")]
    EmptyRentalRequest,

    /// Field-level validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // -- Not found -----------------------------------------------------------
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Rental not found: {0}")]
    RentalNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// The sale exists but has no line for the item.
    #[error("Item {item_id} is not part of sale {sale_id}")]
    LineItemNotFound { sale_id: i64, item_id: String },

    #[error("No outstanding rentals for {0}")]
    NoOutstandingRentals(String),

    // -- Conflict ------------------------------------------------------------
    /// Requested more units than are on hand.
    ///
    /// ## When This Occurs
    /// ```text
    /// Cart line (qty: 5)
    ///      │
    ///      ▼
    /// Read stock: on hand = 3          ← checked on read
    ///      │
    ///      ▼
    /// Conditional decrement at commit  ← checked again, atomically
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "1001", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Rental {rental_id} unavailable: available {available}, requested {requested}")]
    RentalUnavailable {
        rental_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Coupon {0} is inactive")]
    CouponInactive(String),

    #[error("Coupon {0} has expired")]
    CouponExpired(String),

    #[error("Coupon {0} has reached its usage limit")]
    CouponExhausted(String),

    #[error("Coupon {code} requires a minimum purchase of {minimum_cents} cents, subtotal is {subtotal_cents}")]
    MinimumPurchaseNotMet {
        code: String,
        minimum_cents: i64,
        subtotal_cents: i64,
    },

    /// Returning more units than remain unreturned on the sale line.
    #[error("Cannot return {requested} of {item_id}: purchased {purchased}, already returned {already_returned}")]
    ExcessiveReturnQuantity {
        item_id: String,
        purchased: i64,
        already_returned: i64,
        requested: i64,
    },

    // -- Unauthorized --------------------------------------------------------
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Operation requires role {required}")]
    Forbidden { required: Role },

    // -- Persistence ---------------------------------------------------------
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EmptyCart
            | CoreError::InvalidQuantity { .. }
            | CoreError::InvalidPhoneNumber(_)
            | CoreError::EmptyRentalRequest
            | CoreError::Validation(_) => ErrorKind::Validation,

            CoreError::ItemNotFound(_)
            | CoreError::RentalNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::CouponNotFound(_)
            | CoreError::LineItemNotFound { .. }
            | CoreError::NoOutstandingRentals(_) => ErrorKind::NotFound,

            CoreError::InsufficientStock { .. }
            | CoreError::RentalUnavailable { .. }
            | CoreError::CouponInactive(_)
            | CoreError::CouponExpired(_)
            | CoreError::CouponExhausted(_)
            | CoreError::MinimumPurchaseNotMet { .. }
            | CoreError::ExcessiveReturnQuantity { .. } => ErrorKind::Conflict,

            CoreError::InvalidCredentials | CoreError::Forbidden { .. } => ErrorKind::Unauthorized,

            CoreError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// True for the coupon failures the lenient policy downgrades to
    /// "no discount applied".
    pub fn is_coupon_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::CouponNotFound(_)
                | CoreError::CouponInactive(_)
                | CoreError::CouponExpired(_)
                | CoreError::CouponExhausted(_)
                | CoreError::MinimumPurchaseNotMet { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Too many entries in a collection.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
