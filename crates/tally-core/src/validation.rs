//! # Validation Module
//!
//! Input validation for pipeline requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Pipeline entry (THIS MODULE)                                 │
//! │  ├── Phone format, quantities, coupon code shape                       │
//! │  └── Fails before any storage read                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain rules (stock, coupon, rental modules)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), CHECK (available <= total)                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Optional inputs are normalized here once (blank → `None`), and are not
//! re-checked downstream.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::{DEFAULT_RETURN_REASON, MAX_COUPON_CODE_LEN, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Number of digits in a customer phone number.
pub const PHONE_DIGITS: usize = 10;

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a customer phone number: exactly ten ASCII digits after
/// trimming surrounding whitespace.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_phone_number;
///
/// assert_eq!(validate_phone_number(" 5551234567 ").unwrap(), "5551234567");
/// assert!(validate_phone_number("555-123-4567").is_err());
/// assert!(validate_phone_number("123").is_err());
/// ```
pub fn validate_phone_number(phone: &str) -> CoreResult<String> {
    let phone = phone.trim();
    if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidPhoneNumber(phone.to_string()));
    }
    Ok(phone.to_string())
}

/// Validates a line quantity (1 to [`MAX_LINE_QUANTITY`]).
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(CoreError::InvalidQuantity {
            quantity,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates an identifier (item id, rental id, employee id).
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }
    Ok(())
}

/// Normalizes an optional coupon code: trims, upper-cases, maps blank to
/// `None`.
///
/// ## Example
/// ```rust
/// use tally_core::validation::normalize_coupon_code;
///
/// assert_eq!(normalize_coupon_code(Some(" save10 ")).unwrap(), Some("SAVE10".to_string()));
/// assert_eq!(normalize_coupon_code(Some("   ")).unwrap(), None);
/// assert_eq!(normalize_coupon_code(None).unwrap(), None);
/// ```
pub fn normalize_coupon_code(code: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "coupon_code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    Ok(Some(code.to_uppercase()))
}

/// Normalizes a return reason, falling back to the default text.
pub fn normalize_reason(reason: Option<&str>) -> String {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_RETURN_REASON)
        .to_string()
}

/// Validates a price in cents (must be non-negative).
pub fn validate_price_cents(price: i64) -> ValidationResult<()> {
    if price < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a half-open report window `[from, to)`.
pub fn validate_window(from: DateTime<Utc>, to: DateTime<Utc>) -> ValidationResult<()> {
    if from >= to {
        return Err(ValidationError::InvalidFormat {
            field: "to".to_string(),
            reason: "must be later than from".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("5551234567").is_ok());
        assert!(validate_phone_number("0000000000").is_ok());

        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("555123456").is_err());
        assert!(validate_phone_number("55512345678").is_err());
        assert!(validate_phone_number("555123456a").is_err());
        assert!(matches!(
            validate_phone_number("(555)12345"),
            Err(CoreError::InvalidPhoneNumber(_))
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(CoreError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("item_id", "1001").is_ok());
        assert!(validate_identifier("item_id", "  ").is_err());
        assert!(validate_identifier("item_id", &"9".repeat(65)).is_err());
    }

    #[test]
    fn test_normalize_coupon_code_too_long() {
        assert!(normalize_coupon_code(Some(&"A".repeat(21))).is_err());
        assert!(normalize_coupon_code(Some(&"a".repeat(20))).is_ok());
    }

    #[test]
    fn test_normalize_reason() {
        assert_eq!(normalize_reason(None), "No reason provided");
        assert_eq!(normalize_reason(Some("  ")), "No reason provided");
        assert_eq!(normalize_reason(Some(" Damaged ")), "Damaged");
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_window() {
        use chrono::{Duration, TimeZone};
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert!(validate_window(from, from + Duration::days(1)).is_ok());
        assert!(validate_window(from, from).is_err());
        assert!(validate_window(from + Duration::seconds(1), from).is_err());
    }
}
