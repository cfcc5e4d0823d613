//! # Cart Normalization
//!
//! Turns a raw list of requested cart lines into the list the sale
//! pipeline prices: validated, with repeated items merged.
//!
//! ```text
//! [{1001, 2}, {1002, 1}, {1001, 1}]
//!        │
//!        ▼  normalize_cart
//! [{1001, 3}, {1002, 1}]      (first-appearance order kept)
//! ```
//!
//! Merging matters for the stock check: two lines of 2 against 3 on hand
//! must fail even though each line alone would pass.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::CartLine;
use crate::validation::{validate_identifier, validate_quantity};
use crate::MAX_CART_LINES;

/// Validates and merges cart lines.
///
/// ## Errors
/// - `EmptyCart` for an empty list
/// - `InvalidQuantity` for any line below 1 (or a merged line over the max)
/// - `Validation` for a blank item id or too many distinct lines
pub fn normalize_cart(lines: &[CartLine]) -> CoreResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_identifier("item_id", &line.item_id)?;

        let item_id = line.item_id.trim();
        match merged.iter_mut().find(|m| m.item_id == item_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(CartLine::new(item_id, line.quantity)),
        }
    }

    if merged.len() > MAX_CART_LINES {
        return Err(ValidationError::TooMany {
            field: "cart".to_string(),
            max: MAX_CART_LINES,
        }
        .into());
    }
    for line in &merged {
        validate_quantity(line.quantity)?;
    }

    Ok(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cart() {
        assert!(matches!(normalize_cart(&[]), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_invalid_quantity() {
        let lines = vec![CartLine::new("1001", 1), CartLine::new("1002", 0)];
        assert!(matches!(
            normalize_cart(&lines),
            Err(CoreError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_merges_repeated_items_in_order() {
        let lines = vec![
            CartLine::new("1001", 2),
            CartLine::new("1002", 1),
            CartLine::new(" 1001 ", 1),
        ];
        let merged = normalize_cart(&lines).unwrap();
        assert_eq!(merged, vec![CartLine::new("1001", 3), CartLine::new("1002", 1)]);
    }

    #[test]
    fn test_blank_item_id() {
        let lines = vec![CartLine::new("  ", 1)];
        assert!(matches!(normalize_cart(&lines), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_merged_quantity_over_max() {
        let lines = vec![CartLine::new("1001", 600_000_000), CartLine::new("1001", 600_000_000)];
        assert!(matches!(
            normalize_cart(&lines),
            Err(CoreError::InvalidQuantity { quantity: 1_200_000_000, .. })
        ));

        let bulk = vec![CartLine::new("1001", 600), CartLine::new("1001", 600)];
        assert_eq!(normalize_cart(&bulk).unwrap(), vec![CartLine::new("1001", 1200)]);
    }
}
