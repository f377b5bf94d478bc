//! # Record Store Contract
//!
//! The abstract document store the whole system persists into.
//!
//! ## Contract Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RecordStore                                       │
//! │                                                                         │
//! │  get(collection, id)          → Option<document>                        │
//! │  list(collection)             → all documents                           │
//! │  create(collection, doc)      → store-assigned id                       │
//! │  put(collection, id, doc)     → caller-chosen id (stock counters)       │
//! │  update(collection, id, patch)→ shallow field merge                     │
//! │  delete(collection, id)                                                 │
//! │                                                                         │
//! │  ATOMICITY: per call only. Two calls never form a transaction.          │
//! │  Every call can fail independently (it is a network round trip).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `put` exists because stock counters are addressed by their natural
//! (item, location) key; letting the store invent an id for them would force
//! every ledger read back into list-and-filter, which is exactly the access
//! pattern this design retires.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Collection Names
// =============================================================================

/// Stock counters, one document per (item, location).
pub const STOCK: &str = "inventory";
/// Committed sales, append-only.
pub const SALES: &str = "sales";
/// Completed transfers, append-only.
pub const TRANSFERS: &str = "transfers";
/// Stock requests.
pub const STOCK_REQUESTS: &str = "stockRequests";

// =============================================================================
// RecordStore Trait
// =============================================================================

/// Abstract durable document store.
///
/// Implementations must make each call atomic in isolation; callers must
/// never assume atomicity across calls. The Stock Ledger layers per-key
/// locking on top of this contract to serialize conflicting mutations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches one document. `Ok(None)` when absent — absence is not an error.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Fetches every document in a collection.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Inserts a document under a store-assigned id and returns that id.
    async fn create(&self, collection: &str, record: Value) -> StoreResult<String>;

    /// Inserts a document under a caller-chosen id.
    /// Fails with [`StoreError::AlreadyExists`] if the id is taken.
    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()>;

    /// Shallow-merges `patch`'s top-level fields into an existing document.
    /// Fails with [`StoreError::NotFound`] if the id is absent.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()>;

    /// Removes a document. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Fetches and deserializes one document.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get(collection, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Fetches and deserializes a whole collection.
///
/// Documents that fail to deserialize are surfaced as errors rather than
/// skipped: a half-readable collection is a bug, not noise.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
) -> StoreResult<Vec<T>> {
    let values = store.list(collection).await?;
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(StoreError::from))
        .collect()
}

/// Serializes and inserts a document under a caller-chosen id.
pub async fn insert_with_id<T: Serialize>(
    store: &dyn RecordStore,
    collection: &str,
    id: &str,
    record: &T,
) -> StoreResult<()> {
    store
        .put(collection, id, serde_json::to_value(record)?)
        .await
}
