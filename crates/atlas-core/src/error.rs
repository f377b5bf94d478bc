//! # Error Types
//!
//! Input-validation errors for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core (this file)                                                 │
//! │  └── ValidationError  - Input validation failures, no side effects      │
//! │                                                                         │
//! │  atlas-store                                                            │
//! │  ├── StoreError       - Record store failures                           │
//! │  └── LedgerError      - InsufficientStock, reconciliation states        │
//! │                                                                         │
//! │  atlas-engine                                                           │
//! │  └── CheckoutError / VoidError / TransferError / RequestError           │
//! │                                                                         │
//! │  Every variant maps to a distinct, actionable user-facing message.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, field name, limits)
//! 3. Errors are enum variants, never String

use thiserror::Error;

/// Input validation errors.
///
/// Detected before any mutation and returned directly to the caller with
/// no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Duplicate value where uniqueness is required.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
