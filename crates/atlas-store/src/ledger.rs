//! # Stock Ledger
//!
//! Single source of truth for quantity-on-hand. Every increment and
//! decrement in the system goes through this type; nothing else may write
//! the `quantity` field of a stock record.
//!
//! ## Per-Key Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Why a lock registry?                                   │
//! │                                                                         │
//! │  The record store is per-call atomic only. A debit is therefore a       │
//! │  read-check-write sequence, and two concurrent debits of the same       │
//! │  counter could both read 10, both check 7 ≤ 10, and both write —        │
//! │  overselling the shelf.                                                 │
//! │                                                                         │
//! │  The registry holds one async mutex per (item, location) key:           │
//! │                                                                         │
//! │    try_debit(x@shop1)  ──┐                                              │
//! │    try_debit(x@shop1)  ──┤── serialized on the x@shop1 mutex            │
//! │    credit(x@shop1)     ──┘                                              │
//! │    try_debit(y@shop1)  ────── proceeds in parallel (different key)      │
//! │                                                                         │
//! │  Multi-line checkouts lock every line's key in sorted order before      │
//! │  validating, so lock acquisition is deadlock-free and the whole cart    │
//! │  is checked against one consistent view.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry serializes writers within this process; it is the
//! single-writer discipline the deployment model assumes (one ledger
//! instance owns the stock collection).

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use atlas_core::{ItemTemplate, StockKey, StockRecord};
use chrono::Utc;

use crate::error::{LedgerError, LedgerResult, Reconciliation, StoreError, StoreResult};
use crate::store::{self, RecordStore, STOCK};

/// Authoritative arbiter of all stock increments and decrements.
pub struct StockLedger {
    store: Arc<dyn RecordStore>,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        StockLedger {
            store,
            key_locks: DashMap::new(),
        }
    }

    /// The mutex guarding one counter. Locks are created on first touch and
    /// kept for the lifetime of the ledger; the registry is bounded by the
    /// number of distinct (item, location) pairs.
    fn lock_for(&self, key: &StockKey) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(key.record_id())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current stock record for a key, if one exists.
    pub async fn get_record(&self, key: &StockKey) -> StoreResult<Option<StockRecord>> {
        store::fetch(self.store.as_ref(), STOCK, &key.record_id()).await
    }

    /// Quantity on hand. A missing record reads as 0 — not an error.
    pub async fn get_quantity(&self, key: &StockKey) -> StoreResult<i64> {
        Ok(self
            .get_record(key)
            .await?
            .map(|record| record.quantity)
            .unwrap_or(0))
    }

    /// Active records at a location.
    pub async fn list_for_location(&self, location_id: &str) -> StoreResult<Vec<StockRecord>> {
        let records: Vec<StockRecord> = store::fetch_all(self.store.as_ref(), STOCK).await?;
        Ok(records
            .into_iter()
            .filter(|r| r.location_id == location_id && r.is_active)
            .collect())
    }

    /// Active records at a location at or below their reorder threshold.
    pub async fn list_low_stock(&self, location_id: &str) -> StoreResult<Vec<StockRecord>> {
        Ok(self
            .list_for_location(location_id)
            .await?
            .into_iter()
            .filter(StockRecord::is_low_stock)
            .collect())
    }

    // =========================================================================
    // Single-Key Mutations
    // =========================================================================

    /// Conditionally decrements one counter.
    ///
    /// The check runs against the persisted value read **under the key
    /// lock**, never against anything the caller read earlier. On
    /// `InsufficientStock` nothing is mutated.
    ///
    /// A missing **or retired** record reads as unavailable: logical
    /// removal takes the item out of circulation, so its leftover quantity
    /// cannot be sold or transferred until a credit reactivates it.
    ///
    /// Precondition: `amount > 0` (validated by the processors).
    pub async fn try_debit(&self, key: &StockKey, amount: i64) -> LedgerResult<()> {
        debug_assert!(amount > 0);

        let lock = self.lock_for(key);
        let _guard = lock.lock().await;

        let record = self.get_record(key).await?;
        let available = record
            .as_ref()
            .filter(|r| r.is_active)
            .map(|r| r.quantity)
            .unwrap_or(0);

        if available < amount {
            return Err(LedgerError::InsufficientStock {
                item_id: key.item_id.clone(),
                location_id: key.location_id.clone(),
                available,
                requested: amount,
            });
        }

        self.write_quantity(key, available - amount).await?;
        debug!(key = %key, amount, remaining = available - amount, "Debited stock");
        Ok(())
    }

    /// Increments one counter, materializing the record from `template` if
    /// no record exists at the key. Always succeeds (no upper bound).
    ///
    /// A soft-deleted record is reactivated: restock implies the item is
    /// back in circulation at this location.
    ///
    /// Precondition: `amount > 0`.
    pub async fn credit(
        &self,
        key: &StockKey,
        amount: i64,
        template: &ItemTemplate,
    ) -> LedgerResult<()> {
        debug_assert!(amount > 0);

        let lock = self.lock_for(key);
        let _guard = lock.lock().await;

        match self.get_record(key).await? {
            Some(record) => {
                self.store
                    .update(
                        STOCK,
                        &key.record_id(),
                        json!({
                            "quantity": record.quantity + amount,
                            "isActive": true,
                            "updatedAt": Utc::now(),
                        }),
                    )
                    .await?;
                debug!(key = %key, amount, total = record.quantity + amount, "Credited stock");
            }
            None => {
                let record = StockRecord::from_template(template, &key.location_id, amount);
                store::insert_with_id(self.store.as_ref(), STOCK, &key.record_id(), &record)
                    .await?;
                debug!(key = %key, amount, "Created stock record via credit");
            }
        }

        Ok(())
    }

    /// Convenience dispatch: positive delta credits, negative delta debits.
    /// A zero delta is a no-op.
    pub async fn adjust(
        &self,
        key: &StockKey,
        delta: i64,
        template: &ItemTemplate,
    ) -> LedgerResult<()> {
        if delta > 0 {
            self.credit(key, delta, template).await
        } else if delta < 0 {
            self.try_debit(key, -delta).await
        } else {
            Ok(())
        }
    }

    /// Logical removal. The record stays addressable for historical sales
    /// and transfers; a later credit reactivates it.
    pub async fn retire(&self, key: &StockKey) -> LedgerResult<()> {
        let lock = self.lock_for(key);
        let _guard = lock.lock().await;

        self.store
            .update(
                STOCK,
                &key.record_id(),
                json!({ "isActive": false, "updatedAt": Utc::now() }),
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    // Multi-Key Mutations
    // =========================================================================

    /// Validates and debits every cart line as one unit.
    ///
    /// ## Protocol
    /// 1. Lock every line's key, in sorted key order (deadlock freedom).
    /// 2. Re-read every record fresh; if any line would overdraw — or
    ///    references a missing or retired record — fail with
    ///    `InsufficientStock` for that line; **nothing** has been mutated.
    /// 3. Apply all debits. The store is per-call atomic only, so a write
    ///    can fail partway; already-applied debits are then compensated.
    ///    If compensation itself fails, the partial state is reported as
    ///    `ReconciliationRequired` — never silently left short.
    ///
    /// Returns the fresh pre-debit records in cart order, for the caller to
    /// snapshot prices from.
    ///
    /// Precondition: line item ids are distinct and quantities positive
    /// (the checkout processor validates the cart first).
    pub async fn commit_cart_debits(
        &self,
        location_id: &str,
        lines: &[(String, i64)],
    ) -> LedgerResult<Vec<StockRecord>> {
        // Lock in sorted key order.
        let mut ordered: Vec<&(String, i64)> = lines.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut guards: Vec<OwnedMutexGuard<()>> = Vec::with_capacity(ordered.len());
        for (item_id, _) in &ordered {
            let key = StockKey::new(item_id.clone(), location_id);
            guards.push(self.lock_for(&key).lock_owned().await);
        }

        // Fresh reads for every line, in cart order, under the locks.
        let mut fresh: Vec<StockRecord> = Vec::with_capacity(lines.len());
        for (item_id, quantity) in lines {
            let key = StockKey::new(item_id.clone(), location_id);
            match self.get_record(&key).await? {
                Some(record) if record.is_active && record.quantity >= *quantity => {
                    fresh.push(record)
                }
                record => {
                    return Err(LedgerError::InsufficientStock {
                        item_id: item_id.clone(),
                        location_id: location_id.to_string(),
                        available: record
                            .filter(|r| r.is_active)
                            .map(|r| r.quantity)
                            .unwrap_or(0),
                        requested: *quantity,
                    });
                }
            }
        }

        // Apply all debits; compensate on partial failure.
        let mut applied: Vec<usize> = Vec::with_capacity(lines.len());
        for (index, (item_id, quantity)) in lines.iter().enumerate() {
            let key = StockKey::new(item_id.clone(), location_id);
            let new_quantity = fresh[index].quantity - quantity;
            if let Err(err) = self.write_quantity(&key, new_quantity).await {
                return Err(self
                    .compensate_cart(location_id, lines, &fresh, &applied, err)
                    .await);
            }
            applied.push(index);
        }

        Ok(fresh)
    }

    /// Restores already-debited lines after a mid-cart write failure.
    async fn compensate_cart(
        &self,
        location_id: &str,
        lines: &[(String, i64)],
        fresh: &[StockRecord],
        applied: &[usize],
        cause: StoreError,
    ) -> LedgerError {
        let mut completed: Vec<String> = applied
            .iter()
            .map(|&i| format!("debit {}@{} {}", lines[i].0, location_id, lines[i].1))
            .collect();

        for &index in applied {
            let key = StockKey::new(lines[index].0.clone(), location_id);
            // Locks are still held; the pre-debit quantity is authoritative.
            if let Err(comp_err) = self.write_quantity(&key, fresh[index].quantity).await {
                let reconciliation = Reconciliation {
                    operation: "checkout".to_string(),
                    keys: lines
                        .iter()
                        .map(|(item_id, _)| format!("{item_id}@{location_id}"))
                        .collect(),
                    completed,
                    cause: format!("{cause}; compensation failed: {comp_err}"),
                };
                error!(%reconciliation, "Cart debit compensation failed");
                return LedgerError::ReconciliationRequired(reconciliation);
            }
            completed.push(format!(
                "compensated {}@{} {}",
                lines[index].0, location_id, lines[index].1
            ));
        }

        warn!(location_id, %cause, "Cart debit rolled back after store failure");
        LedgerError::Store(cause)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Writes a new quantity. Callers hold the key lock.
    async fn write_quantity(&self, key: &StockKey, quantity: i64) -> StoreResult<()> {
        self.store
            .update(
                STOCK,
                &key.record_id(),
                json!({ "quantity": quantity, "updatedAt": Utc::now() }),
            )
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn template(item_id: &str) -> ItemTemplate {
        ItemTemplate {
            item_id: item_id.to_string(),
            name: format!("Item {item_id}"),
            barcode: None,
            category: "Beverages".to_string(),
            cost_cents: 60,
            price_cents: 99,
            min_stock: 5,
            unit: "pieces".to_string(),
        }
    }

    fn ledger() -> StockLedger {
        StockLedger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_missing_record_reads_zero() {
        let ledger = ledger();
        let key = StockKey::new("ghost", "shop1");
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_credit_creates_then_accumulates() {
        let ledger = ledger();
        let key = StockKey::new("x", "shop1");

        ledger.credit(&key, 10, &template("x")).await.unwrap();
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 10);

        ledger.credit(&key, 5, &template("x")).await.unwrap();
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 15);

        let record = ledger.get_record(&key).await.unwrap().unwrap();
        assert_eq!(record.name, "Item x");
        assert_eq!(record.category, "Beverages");
    }

    #[tokio::test]
    async fn test_try_debit_respects_floor() {
        let ledger = ledger();
        let key = StockKey::new("x", "shop1");
        ledger.credit(&key, 3, &template("x")).await.unwrap();

        let err = ledger.try_debit(&key, 5).await.unwrap_err();
        match err {
            LedgerError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failed debit left the counter untouched.
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 3);

        ledger.try_debit(&key, 3).await.unwrap();
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_debit_missing_record_is_insufficient() {
        let ledger = ledger();
        let key = StockKey::new("ghost", "shop1");
        let err = ledger.try_debit(&key, 1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_adjust_dispatches() {
        let ledger = ledger();
        let key = StockKey::new("x", "shop1");

        ledger.adjust(&key, 8, &template("x")).await.unwrap();
        ledger.adjust(&key, -3, &template("x")).await.unwrap();
        ledger.adjust(&key, 0, &template("x")).await.unwrap();
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 5);

        assert!(ledger.adjust(&key, -6, &template("x")).await.is_err());
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_retired_record_reads_unavailable() {
        let ledger = ledger();
        let key = StockKey::new("x", "shop1");
        ledger.credit(&key, 7, &template("x")).await.unwrap();
        ledger.retire(&key).await.unwrap();

        // Leftover quantity of a retired record cannot be debited...
        let err = ledger.try_debit(&key, 1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 0, .. }
        ));

        // ...and a cart touching it fails the same way.
        let err = ledger
            .commit_cart_debits("shop1", &[("x".to_string(), 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_retire_then_credit_reactivates() {
        let ledger = ledger();
        let key = StockKey::new("x", "shop1");
        ledger.credit(&key, 4, &template("x")).await.unwrap();

        ledger.retire(&key).await.unwrap();
        assert!(ledger.list_for_location("shop1").await.unwrap().is_empty());

        ledger.credit(&key, 2, &template("x")).await.unwrap();
        let record = ledger.get_record(&key).await.unwrap().unwrap();
        assert!(record.is_active);
        assert_eq!(record.quantity, 6);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let ledger = ledger();
        ledger
            .credit(&StockKey::new("a", "shop1"), 4, &template("a"))
            .await
            .unwrap(); // min_stock 5 → low
        ledger
            .credit(&StockKey::new("b", "shop1"), 50, &template("b"))
            .await
            .unwrap();
        ledger
            .credit(&StockKey::new("c", "shop2"), 1, &template("c"))
            .await
            .unwrap(); // other location

        let low = ledger.list_low_stock("shop1").await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].item_id, "a");
    }

    #[tokio::test]
    async fn test_commit_cart_debits_all_or_nothing() {
        let ledger = ledger();
        ledger
            .credit(&StockKey::new("a", "shop1"), 10, &template("a"))
            .await
            .unwrap();
        ledger
            .credit(&StockKey::new("b", "shop1"), 2, &template("b"))
            .await
            .unwrap();

        // Line b overdraws; line a must stay untouched.
        let err = ledger
            .commit_cart_debits("shop1", &[("a".to_string(), 5), ("b".to_string(), 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        assert_eq!(
            ledger.get_quantity(&StockKey::new("a", "shop1")).await.unwrap(),
            10
        );
        assert_eq!(
            ledger.get_quantity(&StockKey::new("b", "shop1")).await.unwrap(),
            2
        );

        // A valid cart debits every line.
        let fresh = ledger
            .commit_cart_debits("shop1", &[("a".to_string(), 5), ("b".to_string(), 2)])
            .await
            .unwrap();
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].quantity, 10); // pre-debit snapshot
        assert_eq!(
            ledger.get_quantity(&StockKey::new("a", "shop1")).await.unwrap(),
            5
        );
        assert_eq!(
            ledger.get_quantity(&StockKey::new("b", "shop1")).await.unwrap(),
            0
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_debits_never_oversell() {
        let ledger = Arc::new(ledger());
        let key = StockKey::new("x", "shop1");
        ledger.credit(&key, 10, &template("x")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let ledger = Arc::clone(&ledger);
            let key = key.clone();
            handles.push(tokio::spawn(
                async move { ledger.try_debit(&key, 1).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // Exactly enough succeed to exhaust stock; the rest fail cleanly.
        assert_eq!(successes, 10);
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replay_conservation() {
        // quantity after replay = initial + credits − successful debits
        let ledger = Arc::new(ledger());
        let key = StockKey::new("x", "shop1");
        ledger.credit(&key, 100, &template("x")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let ledger = Arc::clone(&ledger);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    ledger.credit(&key, 2, &template("x")).await.map(|_| 2)
                } else {
                    ledger.try_debit(&key, 3).await.map(|_| -3)
                }
            }));
        }

        let mut expected = 100i64;
        for handle in handles {
            if let Ok(delta) = handle.await.unwrap() {
                expected += delta;
            }
        }

        let final_quantity = ledger.get_quantity(&key).await.unwrap();
        assert_eq!(final_quantity, expected);
        assert!(final_quantity >= 0);
    }
}
