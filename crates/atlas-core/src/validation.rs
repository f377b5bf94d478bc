//! # Validation Module
//!
//! Input validation utilities for Atlas POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                      │
//! │  └── Basic format checks, immediate user feedback                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any I/O)                                  │
//! │  └── Business rule validation; a failure here guarantees that no        │
//! │      mutation was attempted                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger re-validation (under the key lock, fresh read)         │
//! │  └── Race detection: InsufficientStock / StockChanged                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_LINE_QUANTITY, MAX_REASON_LEN};

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for checkout lines, transfers, and stock requests.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents.
///
/// Zero is allowed (free items, unknown cost).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a void or stock-request reason.
///
/// ## Rules
/// - Must not be empty after trimming (voiding without a reason is the
///   audit hole the void flow exists to close)
/// - At most MAX_REASON_LEN characters
///
/// ## Returns
/// The trimmed reason string.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(reason.to_string())
}

/// Validates an item name.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(name.to_string())
}

/// Validates a location id (non-empty identifier).
pub fn validate_location_id(location_id: &str) -> ValidationResult<()> {
    if location_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "location_id".to_string(),
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
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("  damaged goods ").unwrap(), "damaged goods");
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"x".repeat(600)).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Coca-Cola 330ml").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_location_id() {
        assert!(validate_location_id("shop1").is_ok());
        assert!(validate_location_id(" ").is_err());
    }
}
