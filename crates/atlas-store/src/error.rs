//! # Store Error Types
//!
//! Error types for record-store and ledger operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure (I/O, serialization)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError ← adds collection/id context                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerError ← InsufficientStock, or ReconciliationRequired when a      │
//! │       │        multi-key sequence partially applied                     │
//! │       ▼                                                                 │
//! │  atlas-engine maps to its per-processor error taxonomy                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use thiserror::Error;

/// Record store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document not found where the operation requires it to exist
    /// (update/delete of a missing id).
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// A document exists where `put` expected to create a fresh one.
    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    /// Document could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure (network round trip, disk, quota...).
    #[error("store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a NotFound error for a given collection and id.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Reconciliation Report
// =============================================================================

/// Description of a multi-step mutation that could not be fully completed
/// or compensated.
///
/// This is the payload of every reconciliation-class error in the system.
/// It must carry enough detail (operation, keys touched, which steps
/// completed) for manual or automated reconciliation, and it is always
/// logged at `error!` level before being returned — never swallowed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Reconciliation {
    /// Which operation was in flight ("checkout", "void_sale", "transfer").
    pub operation: String,
    /// Stock keys touched by the operation.
    pub keys: Vec<String>,
    /// Steps that had already completed when the failure hit.
    pub completed: Vec<String>,
    /// The underlying failure, rendered.
    pub cause: String,
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operation={} keys=[{}] completed=[{}] cause={}",
            self.operation,
            self.keys.join(", "),
            self.completed.join(", "),
            self.cause
        )
    }
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Stock Ledger operation errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit would overdraw the counter. No mutation was applied.
    #[error("insufficient stock for {item_id} at {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// Record store failed before any counter was mutated.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A multi-key sequence partially applied and could not be compensated.
    /// Operators must escalate, not retry.
    #[error("reconciliation required: {0}")]
    ReconciliationRequired(Reconciliation),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
