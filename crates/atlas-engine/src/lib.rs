//! # atlas-engine: Transaction Processors for Atlas POS
//!
//! The only mutation path the application may call. Every stock movement in
//! the system — sale, void, transfer — goes through one of the processors
//! here, which share a single [`StockLedger`] so per-key serialization
//! holds across operation types.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Mutation Path                          │
//! │                                                                         │
//! │  UI / API caller                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   atlas-engine (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌────────────────┐ │   │
//! │  │  │ checkout  │ │   void    │ │ transfer  │ │ stock requests │ │   │
//! │  │  └─────┬─────┘ └─────┬─────┘ └─────┬─────┘ └───────┬────────┘ │   │
//! │  │        └─────────────┴──────┬──────┴───────────────┘          │   │
//! │  └─────────────────────────────┼─────────────────────────────────┘   │
//! │                                ▼                                       │
//! │            shared StockLedger + repositories (atlas-store)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checkout`] - Cart → atomic multi-line debit → frozen Sale
//! - [`void`] - Restock every line, then flip the void sub-state
//! - [`transfer`] - Debit source, credit destination, audit record
//! - [`requests`] - Stock-request lifecycle (pending → approved/rejected)
//! - [`error`] - Per-processor error taxonomy

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod requests;
pub mod transfer;
pub mod void;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutProcessor;
pub use error::{CheckoutError, RequestError, TransferError, VoidError};
pub use requests::StockRequestProcessor;
pub use transfer::TransferProcessor;
pub use void::VoidProcessor;

use std::sync::Arc;

use atlas_store::{RecordStore, StockLedger};

/// All processors wired over one record store and one shared ledger.
///
/// The single ledger instance is what makes cross-operation races safe:
/// a checkout and a transfer touching the same counter serialize on the
/// same per-key lock.
pub struct Engine {
    pub ledger: Arc<StockLedger>,
    pub checkout: CheckoutProcessor,
    pub voids: VoidProcessor,
    pub transfers: TransferProcessor,
    pub requests: StockRequestProcessor,
}

impl Engine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let ledger = Arc::new(StockLedger::new(Arc::clone(&store)));
        Engine {
            checkout: CheckoutProcessor::new(Arc::clone(&ledger), Arc::clone(&store)),
            voids: VoidProcessor::new(Arc::clone(&ledger), Arc::clone(&store)),
            transfers: TransferProcessor::new(Arc::clone(&ledger), Arc::clone(&store)),
            requests: StockRequestProcessor::new(store),
            ledger,
        }
    }
}
