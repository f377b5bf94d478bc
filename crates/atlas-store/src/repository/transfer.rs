//! # Transfer Repository
//!
//! Record-store operations for completed transfers. Transfers are written
//! once and never touched again.

use std::sync::Arc;

use tracing::debug;

use atlas_core::Transfer;

use crate::error::StoreResult;
use crate::store::{self, RecordStore, TRANSFERS};

/// Repository for transfer records.
#[derive(Clone)]
pub struct TransferRepository {
    store: Arc<dyn RecordStore>,
}

impl TransferRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        TransferRepository { store }
    }

    /// Persists a completed transfer under its pre-generated id.
    pub async fn insert(&self, transfer: &Transfer) -> StoreResult<()> {
        debug!(
            transfer_id = %transfer.id,
            item_id = %transfer.item_id,
            from = %transfer.from_location_id,
            to = %transfer.to_location_id,
            quantity = transfer.quantity,
            "Inserting transfer"
        );
        store::insert_with_id(self.store.as_ref(), TRANSFERS, &transfer.id, transfer).await
    }

    /// Fetches a transfer by id.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Transfer>> {
        store::fetch(self.store.as_ref(), TRANSFERS, id).await
    }

    /// Transfers touching one location (as source or destination),
    /// newest first.
    pub async fn list_for_location(&self, location_id: &str) -> StoreResult<Vec<Transfer>> {
        let mut transfers: Vec<Transfer> =
            store::fetch_all(self.store.as_ref(), TRANSFERS).await?;
        transfers
            .retain(|t| t.from_location_id == location_id || t.to_location_id == location_id);
        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transfers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
