//! # Transfer Processor
//!
//! Moves stock between locations: debit the source counter, credit the
//! destination counter, write the audit record.
//!
//! ## Consistency
//! The two counters are separate documents in a per-call-atomic store, so
//! the move is two ledger calls. Conservation holds at every exit:
//!
//! - debit fails → nothing moved
//! - credit fails → the debit is credited back to the source
//! - audit write fails → the whole move is reversed
//! - any reversal fails → `ReconciliationRequired` naming both keys
//!
//! A reversal can legitimately fail even without a store fault: once the
//! destination is credited another operation may consume those units before
//! the reversal debits them back. That window is inherent to the store
//! model and is exactly what the reconciliation report exists for.
//!
//! If the destination has no record for the item yet, the credit
//! materializes one from the source record's descriptive fields (name,
//! barcode, category, prices, threshold, unit).

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use atlas_core::{validation, ItemTemplate, Operator, StockKey, Transfer};
use atlas_store::{
    LedgerError, Reconciliation, RecordStore, StockLedger, StoreError, TransferRepository,
};

use crate::error::TransferError;

/// Moves stock between locations. Cheap to clone; shares the ledger.
#[derive(Clone)]
pub struct TransferProcessor {
    ledger: Arc<StockLedger>,
    transfers: TransferRepository,
}

impl TransferProcessor {
    pub fn new(ledger: Arc<StockLedger>, store: Arc<dyn RecordStore>) -> Self {
        TransferProcessor {
            ledger,
            transfers: TransferRepository::new(store),
        }
    }

    /// Moves `quantity` units of `item_id` from one location to another.
    ///
    /// Total stock across both locations is conserved on every path except
    /// the explicitly reported `ReconciliationRequired`.
    pub async fn transfer(
        &self,
        item_id: &str,
        from_location_id: &str,
        to_location_id: &str,
        quantity: i64,
        operator: &Operator,
    ) -> Result<Transfer, TransferError> {
        if !operator.role.can_transfer() {
            return Err(TransferError::NotAuthorized {
                operator_id: operator.id.clone(),
            });
        }
        validation::validate_location_id(from_location_id)?;
        validation::validate_location_id(to_location_id)?;
        if from_location_id == to_location_id {
            return Err(TransferError::SameLocation);
        }
        if validation::validate_quantity(quantity).is_err() {
            return Err(TransferError::InvalidQuantity {
                requested: quantity,
            });
        }

        let source_key = StockKey::new(item_id, from_location_id);
        let dest_key = StockKey::new(item_id, to_location_id);

        // The source record doubles as the destination's template. A missing
        // record is an availability failure, not a lookup error.
        let source = self
            .ledger
            .get_record(&source_key)
            .await
            .map_err(|e| TransferError::from(LedgerError::Store(e)))?
            .ok_or_else(|| TransferError::InsufficientStock {
                location_id: from_location_id.to_string(),
                available: 0,
                requested: quantity,
            })?;
        let template = source.template();

        // Debit re-checks availability under the source key lock.
        self.ledger.try_debit(&source_key, quantity).await?;

        if let Err(err) = self.ledger.credit(&dest_key, quantity, &template).await {
            return Err(self
                .undo_debit(&source_key, &dest_key, quantity, &template, err.to_string())
                .await);
        }

        let transfer = Transfer {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            item_name: source.name.clone(),
            from_location_id: from_location_id.to_string(),
            to_location_id: to_location_id.to_string(),
            quantity,
            operator_id: operator.id.clone(),
            created_at: Utc::now(),
        };

        if let Err(err) = self.transfers.insert(&transfer).await {
            return Err(self
                .undo_move(&source_key, &dest_key, quantity, &template, err)
                .await);
        }

        info!(
            transfer_id = %transfer.id,
            item_id,
            from = from_location_id,
            to = to_location_id,
            quantity,
            operator_id = %operator.id,
            "Transfer completed"
        );
        Ok(transfer)
    }

    /// Credits the debited quantity back to the source after the destination
    /// credit failed.
    async fn undo_debit(
        &self,
        source_key: &StockKey,
        dest_key: &StockKey,
        quantity: i64,
        template: &ItemTemplate,
        cause: String,
    ) -> TransferError {
        if let Err(credit_err) = self.ledger.credit(source_key, quantity, template).await {
            let reconciliation = Reconciliation {
                operation: "transfer".to_string(),
                keys: vec![source_key.record_id(), dest_key.record_id()],
                completed: vec![format!("debit {} {}", source_key, quantity)],
                cause: format!("{cause}; compensation failed: {credit_err}"),
            };
            error!(%reconciliation, "Transfer compensation failed");
            return TransferError::ReconciliationRequired(reconciliation);
        }

        warn!(source = %source_key, dest = %dest_key, %cause, "Transfer rolled back");
        TransferError::Persistence(StoreError::Backend(cause))
    }

    /// Reverses a fully-applied move after the audit record write failed.
    async fn undo_move(
        &self,
        source_key: &StockKey,
        dest_key: &StockKey,
        quantity: i64,
        template: &ItemTemplate,
        cause: StoreError,
    ) -> TransferError {
        let completed = vec![
            format!("debit {} {}", source_key, quantity),
            format!("credit {} {}", dest_key, quantity),
        ];

        // Another operation may already have consumed the destination units.
        let reversal = match self.ledger.try_debit(dest_key, quantity).await {
            Ok(()) => self.ledger.credit(source_key, quantity, template).await,
            Err(err) => Err(err),
        };

        if let Err(reversal_err) = reversal {
            let reconciliation = Reconciliation {
                operation: "transfer".to_string(),
                keys: vec![source_key.record_id(), dest_key.record_id()],
                completed,
                cause: format!("{cause}; reversal failed: {reversal_err}"),
            };
            error!(%reconciliation, "Transfer reversal failed; audit record missing");
            return TransferError::ReconciliationRequired(reconciliation);
        }

        warn!(source = %source_key, dest = %dest_key, %cause, "Transfer reversed after audit write failed");
        TransferError::Persistence(cause)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
