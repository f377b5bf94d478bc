//! # atlas-store: Persistence Layer for Atlas POS
//!
//! This crate provides record access for the Atlas POS inventory ledger.
//! It defines the abstract document-store contract, ships an in-memory
//! backend, and hosts the **Stock Ledger** — the only writer of
//! quantity-on-hand in the entire system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Data Flow                              │
//! │                                                                         │
//! │  atlas-engine processor (checkout / void / transfer)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     atlas-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  StockLedger  │    │  Repositories │    │ RecordStore  │  │   │
//! │  │   │  (ledger.rs)  │    │  (sale.rs,    │    │  contract +  │  │   │
//! │  │   │               │    │   transfer.rs,│    │  MemoryStore │  │   │
//! │  │   │ per-key locks │───►│   request.rs) │───►│              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Durable document store (external; per-call atomic only)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `RecordStore` trait, collection names, typed helpers
//! - [`memory`] - In-memory backend for tests and embedded use
//! - [`ledger`] - The Stock Ledger with its per-key lock registry
//! - [`repository`] - Sale / Transfer / StockRequest repositories
//! - [`error`] - Store and ledger error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod memory;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{LedgerError, Reconciliation, StoreError};
pub use ledger::StockLedger;
pub use memory::MemoryStore;
pub use store::RecordStore;

// Repository re-exports for convenience
pub use repository::request::StockRequestRepository;
pub use repository::sale::SaleRepository;
pub use repository::transfer::TransferRepository;
