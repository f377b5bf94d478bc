//! # In-Memory Record Store
//!
//! The embedded backend: a collection → id → document map behind an async
//! RwLock. Used by every test in the workspace and suitable for
//! single-process deployments; a cloud document store drops in behind the
//! same [`RecordStore`] trait.
//!
//! Each trait call takes the lock once, so calls are atomic in isolation —
//! matching (not exceeding) the contract's guarantee. Nothing here provides
//! cross-call transactions, which keeps tests honest about the race windows
//! the ledger has to close.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::RecordStore;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-memory [`RecordStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create(&self, collection: &str, record: Value) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        docs.insert(id.to_string(), record);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        match (doc, patch) {
            (Value::Object(existing), Value::Object(fields)) => {
                for (key, value) in fields {
                    existing.insert(key, value);
                }
                Ok(())
            }
            _ => Err(StoreError::Backend(
                "update requires object documents".to_string(),
            )),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("inventory", "nope").await.unwrap().is_none());
        assert!(store.list("inventory").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store.create("sales", json!({"n": 1})).await.unwrap();
        let b = store.create("sales", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list("sales").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_put_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store.put("inventory", "x@shop1", json!({"quantity": 5})).await.unwrap();
        let err = store
            .put("inventory", "x@shop1", json!({"quantity": 9}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_top_level_fields() {
        let store = MemoryStore::new();
        store
            .put("inventory", "x@shop1", json!({"quantity": 5, "name": "X"}))
            .await
            .unwrap();
        store
            .update("inventory", "x@shop1", json!({"quantity": 3}))
            .await
            .unwrap();

        let doc = store.get("inventory", "x@shop1").await.unwrap().unwrap();
        assert_eq!(doc["quantity"], 3);
        assert_eq!(doc["name"], "X");
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let store = MemoryStore::new();
        let err = store
            .update("inventory", "ghost", json!({"quantity": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.put("inventory", "x@shop1", json!({})).await.unwrap();
        store.delete("inventory", "x@shop1").await.unwrap();
        assert!(store.get("inventory", "x@shop1").await.unwrap().is_none());
        assert!(store.delete("inventory", "x@shop1").await.is_err());
    }
}
