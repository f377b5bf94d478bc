//! # Sale Repository
//!
//! Record-store operations for committed sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. INSERT      checkout processor writes the complete, frozen Sale     │
//! │  2. (OPTIONAL)  void processor calls mark_voided() — exactly once       │
//! │                                                                         │
//! │  There is no update path for lines, totals, or profit. History is       │
//! │  immutable; price edits after the fact change nothing here.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use atlas_core::Sale;

use crate::error::StoreResult;
use crate::store::{self, RecordStore, SALES};

/// Repository for sale records.
#[derive(Clone)]
pub struct SaleRepository {
    store: Arc<dyn RecordStore>,
}

impl SaleRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        SaleRepository { store }
    }

    /// Persists a complete sale under its pre-generated id.
    pub async fn insert(&self, sale: &Sale) -> StoreResult<()> {
        debug!(sale_id = %sale.id, location_id = %sale.location_id, total = %sale.total(), "Inserting sale");
        store::insert_with_id(self.store.as_ref(), SALES, &sale.id, sale).await
    }

    /// Fetches a sale by id.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        store::fetch(self.store.as_ref(), SALES, id).await
    }

    /// Sales at one location, newest first.
    pub async fn list_by_location(&self, location_id: &str) -> StoreResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = store::fetch_all(self.store.as_ref(), SALES).await?;
        sales.retain(|s| s.location_id == location_id);
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    /// Flips the void sub-state. The caller (void processor) guarantees the
    /// sale exists and is not yet voided; this writes only the void fields.
    pub async fn mark_voided(
        &self,
        sale_id: &str,
        voided_by: &str,
        reason: &str,
        voided_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        debug!(sale_id = %sale_id, voided_by = %voided_by, "Marking sale voided");
        self.store
            .update(
                SALES,
                sale_id,
                json!({
                    "voided": true,
                    "voidedBy": voided_by,
                    "voidReason": reason,
                    "voidedAt": voided_at,
                }),
            )
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
