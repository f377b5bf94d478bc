//! # Processor Error Taxonomy
//!
//! Each processor exposes its own error enum so callers can branch on
//! exactly the failures that operation can produce. All four share three
//! conventions:
//!
//! - **Validation failures** happen before any I/O; nothing was mutated.
//! - **Persistence failures** mean the store failed but the system is
//!   consistent (either nothing applied, or compensation restored it).
//!   These are safe to retry.
//! - **`ReconciliationRequired`** means a multi-step mutation partially
//!   applied and compensation also failed. The payload names the keys and
//!   completed steps; operators must escalate, not retry.

use thiserror::Error;

use atlas_core::{RequestStatus, ValidationError};
use atlas_store::{LedgerError, Reconciliation, StoreError};

// =============================================================================
// Checkout
// =============================================================================

/// Errors produced by the checkout processor.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart had no lines. Nothing was attempted.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The cart failed shape validation (bad quantity, duplicate lines...).
    #[error("invalid cart: {0}")]
    InvalidCart(#[from] ValidationError),

    /// A line would overdraw the counter as it stands **now**. The cashier
    /// should refresh the displayed stock and retry.
    #[error("stock changed for {item_id}: available {available}, requested {requested}")]
    StockChanged {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// The store failed but every debit was rolled back; no sale was
    /// recorded. Safe to retry.
    #[error("checkout persistence failed: {0}")]
    Persistence(StoreError),

    /// Debits partially applied and could not be compensated.
    #[error("reconciliation required: {0}")]
    ReconciliationRequired(Reconciliation),
}

impl From<LedgerError> for CheckoutError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                item_id,
                available,
                requested,
                ..
            } => CheckoutError::StockChanged {
                item_id,
                available,
                requested,
            },
            LedgerError::Store(store) => CheckoutError::Persistence(store),
            LedgerError::ReconciliationRequired(rec) => CheckoutError::ReconciliationRequired(rec),
        }
    }
}

// =============================================================================
// Void
// =============================================================================

/// Errors produced by the void processor.
#[derive(Debug, Error)]
pub enum VoidError {
    /// No sale with this id exists.
    #[error("sale {0} not found")]
    NotFound(String),

    /// The sale was already voided; stock was restored exactly once and
    /// will not be restored again.
    #[error("sale {0} is already voided")]
    AlreadyVoided(String),

    /// Voiding requires a non-empty reason.
    #[error("a void reason is required")]
    ReasonRequired,

    /// The reason (or other input) failed validation.
    #[error("invalid void request: {0}")]
    Invalid(ValidationError),

    /// The caller's role does not permit voiding.
    #[error("operator {operator_id} is not allowed to void sales")]
    NotAuthorized { operator_id: String },

    /// The store failed before any stock was restored. Safe to retry.
    #[error("void persistence failed: {0}")]
    Persistence(StoreError),

    /// Restock or flag-write partially applied.
    #[error("reconciliation required: {0}")]
    ReconciliationRequired(Reconciliation),
}

// =============================================================================
// Transfer
// =============================================================================

/// Errors produced by the transfer processor.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source and destination must differ.
    #[error("transfer source and destination are the same location")]
    SameLocation,

    /// Quantity must be a positive integer within the per-line bound.
    #[error("invalid transfer quantity: {requested}")]
    InvalidQuantity { requested: i64 },

    /// The source location does not hold enough stock. Nothing was moved.
    #[error("insufficient stock at {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// Some other input failed validation (empty location id...).
    #[error("invalid transfer request: {0}")]
    Invalid(#[from] ValidationError),

    /// The caller's role does not permit transfers.
    #[error("operator {operator_id} is not allowed to transfer stock")]
    NotAuthorized { operator_id: String },

    /// The store failed but both counters were restored. Safe to retry.
    #[error("transfer persistence failed: {0}")]
    Persistence(StoreError),

    /// Counters partially moved and could not be restored.
    #[error("reconciliation required: {0}")]
    ReconciliationRequired(Reconciliation),
}

impl From<LedgerError> for TransferError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                location_id,
                available,
                requested,
                ..
            } => TransferError::InsufficientStock {
                location_id,
                available,
                requested,
            },
            LedgerError::Store(store) => TransferError::Persistence(store),
            LedgerError::ReconciliationRequired(rec) => TransferError::ReconciliationRequired(rec),
        }
    }
}

// =============================================================================
// Stock Requests
// =============================================================================

/// Errors produced by the stock-request processor.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No request with this id exists.
    #[error("stock request {0} not found")]
    NotFound(String),

    /// The request was decided earlier; decisions are one-shot.
    #[error("stock request {id} was already decided ({status:?})")]
    AlreadyDecided { id: String, status: RequestStatus },

    /// Submission input failed validation.
    #[error("invalid stock request: {0}")]
    Invalid(#[from] ValidationError),

    /// The caller's role does not permit deciding requests.
    #[error("operator {operator_id} is not allowed to decide stock requests")]
    NotAuthorized { operator_id: String },

    /// Record store failure.
    #[error("stock request persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

// =============================================================================
// Unit Tests
// =============================================================================
