//! # Void Processor
//!
//! Reverses a committed sale: restores every line's stock, then flips the
//! sale's void sub-state with the full audit trail (who, why, when).
//!
//! ## Ordering
//! Stock is restored **before** the void flag is written. If the flag write
//! then fails, the sale still reads as active while its stock is back on
//! the shelf — recoverable by retrying the flag write during
//! reconciliation. The reverse order would be worse: a voided-looking sale
//! whose stock never came back silently loses inventory.
//!
//! Restock targets the sale's own lines. If an item's record was retired or
//! deleted since the sale, the credit materializes a record from the line's
//! frozen snapshot; sales of since-removed items remain voidable.
//!
//! ## Per-Sale Serialization
//! The voided check is a read-check-write against a per-call-atomic store,
//! so voids of one sale are serialized on a per-sale-id mutex — the same
//! registry discipline the ledger applies per stock key. Without it, two
//! concurrent voids could both observe `voided == false` and restore the
//! stock twice.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info};

use atlas_core::{validation, Operator, Sale, StockKey, ValidationError};
use atlas_store::{LedgerError, Reconciliation, RecordStore, SaleRepository, StockLedger};

use crate::error::VoidError;

/// Voids committed sales. Cheap to clone; shares the ledger and the
/// per-sale lock registry.
#[derive(Clone)]
pub struct VoidProcessor {
    ledger: Arc<StockLedger>,
    sales: SaleRepository,
    sale_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl VoidProcessor {
    pub fn new(ledger: Arc<StockLedger>, store: Arc<dyn RecordStore>) -> Self {
        VoidProcessor {
            ledger,
            sales: SaleRepository::new(store),
            sale_locks: Arc::new(DashMap::new()),
        }
    }

    /// The mutex guarding one sale's void sub-state.
    fn lock_for(&self, sale_id: &str) -> Arc<Mutex<()>> {
        self.sale_locks
            .entry(sale_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Voids the sale, restoring its stock exactly once.
    ///
    /// Returns the sale with its void sub-state populated. A sale can be
    /// voided only once; `AlreadyVoided` guarantees stock was not restored
    /// a second time.
    pub async fn void_sale(
        &self,
        sale_id: &str,
        operator: &Operator,
        reason: &str,
    ) -> Result<Sale, VoidError> {
        if !operator.role.can_void() {
            return Err(VoidError::NotAuthorized {
                operator_id: operator.id.clone(),
            });
        }

        let reason = match validation::validate_reason(reason) {
            Ok(trimmed) => trimmed,
            Err(ValidationError::Required { .. }) => return Err(VoidError::ReasonRequired),
            Err(other) => return Err(VoidError::Invalid(other)),
        };

        // Serialize per sale id: the voided check below must not race a
        // concurrent void of the same sale.
        let lock = self.lock_for(sale_id);
        let _guard = lock.lock().await;

        let mut sale = self
            .sales
            .get_by_id(sale_id)
            .await
            .map_err(VoidError::Persistence)?
            .ok_or_else(|| VoidError::NotFound(sale_id.to_string()))?;
        if sale.voided {
            return Err(VoidError::AlreadyVoided(sale.id));
        }

        // Restore stock line by line, then flip the flag.
        let mut completed: Vec<String> = Vec::with_capacity(sale.lines.len() + 1);
        for line in &sale.lines {
            let key = StockKey::new(line.item_id.clone(), sale.location_id.clone());
            if let Err(err) = self
                .ledger
                .credit(&key, line.quantity, &line.restock_template())
                .await
            {
                return Err(self.report_partial_void(&sale, completed, err));
            }
            completed.push(format!("credit {} {}", key, line.quantity));
        }

        let now = Utc::now();
        if let Err(err) = self
            .sales
            .mark_voided(&sale.id, &operator.id, &reason, now)
            .await
        {
            return Err(self.report_partial_void(&sale, completed, LedgerError::Store(err)));
        }

        sale.voided = true;
        sale.voided_by = Some(operator.id.clone());
        sale.void_reason = Some(reason);
        sale.voided_at = Some(now);

        info!(
            sale_id = %sale.id,
            location_id = %sale.location_id,
            voided_by = %operator.id,
            units = sale.unit_count(),
            "Sale voided"
        );
        Ok(sale)
    }

    /// Classifies a mid-void failure.
    ///
    /// If nothing was restored yet the system is consistent and the error
    /// is a retryable persistence failure; otherwise the partial restock is
    /// reported for reconciliation.
    fn report_partial_void(
        &self,
        sale: &Sale,
        completed: Vec<String>,
        cause: LedgerError,
    ) -> VoidError {
        if completed.is_empty() {
            if let LedgerError::Store(store_err) = cause {
                return VoidError::Persistence(store_err);
            }
        }

        let reconciliation = Reconciliation {
            operation: "void_sale".to_string(),
            keys: sale
                .lines
                .iter()
                .map(|line| format!("{}@{}", line.item_id, sale.location_id))
                .collect(),
            completed,
            cause: cause.to_string(),
        };
        error!(%reconciliation, sale_id = %sale.id, "Void partially applied");
        VoidError::ReconciliationRequired(reconciliation)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
