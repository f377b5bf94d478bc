//! # Cart Math
//!
//! Pure checkout arithmetic: snapshotting cart lines against fresh stock
//! records and computing the totals that get frozen into the sale.
//!
//! ## Snapshot Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartLine (display-time, untrusted prices)                              │
//! │       │                                                                 │
//! │       │   + fresh StockRecord (read under the ledger's key lock)        │
//! │       ▼                                                                 │
//! │  SaleLine (price & cost frozen)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  totals() → (total, profit)   computed once, stored on the Sale         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, SaleLine, StockRecord};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};
use std::collections::HashSet;

/// Validates the shape of a cart before any I/O happens.
///
/// ## Rules
/// - At most [`MAX_CART_LINES`] lines
/// - Every quantity in `1..=MAX_LINE_QUANTITY`
/// - No duplicate item ids (duplicates would double-lock one counter;
///   the UI merges repeated scans into one line, so a duplicate here is
///   a malformed request, not a user mistake)
///
/// Emptiness is deliberately not checked here: the checkout processor
/// reports an empty cart as its own error kind.
pub fn validate_cart(lines: &[CartLine]) -> Result<(), ValidationError> {
    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item_id".to_string(),
            });
        }
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            });
        }
        if !seen.insert(line.item_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "item_id".to_string(),
                value: line.item_id.clone(),
            });
        }
    }

    Ok(())
}

/// Freezes one cart line against the stock record read at commit time.
///
/// Price and cost come from the record, never from the cart line — the
/// cart's copies may be minutes old.
pub fn snapshot_line(line: &CartLine, record: &StockRecord) -> SaleLine {
    SaleLine {
        item_id: record.item_id.clone(),
        name: record.name.clone(),
        price_cents: record.price_cents,
        cost_cents: record.cost_cents,
        quantity: line.quantity,
    }
}

/// Computes (total, profit) for a set of frozen sale lines.
pub fn totals(lines: &[SaleLine]) -> (Money, Money) {
    let total: Money = lines.iter().map(SaleLine::line_total).sum();
    let profit: Money = lines.iter().map(SaleLine::line_profit).sum();
    (total, profit)
}

// =============================================================================
// Unit Tests
// =============================================================================
