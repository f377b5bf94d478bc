//! # Stock Request Repository
//!
//! Record-store operations for stock requests. Requests are created
//! pending and decided (approved/rejected) exactly once; the decision
//! writes only the decision fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use atlas_core::{RequestStatus, StockRequest};

use crate::error::StoreResult;
use crate::store::{self, RecordStore, STOCK_REQUESTS};

/// Repository for stock request records.
#[derive(Clone)]
pub struct StockRequestRepository {
    store: Arc<dyn RecordStore>,
}

impl StockRequestRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        StockRequestRepository { store }
    }

    /// Persists a new (pending) request under its pre-generated id.
    pub async fn insert(&self, request: &StockRequest) -> StoreResult<()> {
        debug!(request_id = %request.id, location_id = %request.location_id, "Inserting stock request");
        store::insert_with_id(self.store.as_ref(), STOCK_REQUESTS, &request.id, request).await
    }

    /// Fetches a request by id.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<StockRequest>> {
        store::fetch(self.store.as_ref(), STOCK_REQUESTS, id).await
    }

    /// Requests raised by one location, newest first.
    pub async fn list_by_location(&self, location_id: &str) -> StoreResult<Vec<StockRequest>> {
        let mut requests: Vec<StockRequest> =
            store::fetch_all(self.store.as_ref(), STOCK_REQUESTS).await?;
        requests.retain(|r| r.location_id == location_id);
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    /// All requests, newest first (admin view).
    pub async fn list_all(&self) -> StoreResult<Vec<StockRequest>> {
        let mut requests: Vec<StockRequest> =
            store::fetch_all(self.store.as_ref(), STOCK_REQUESTS).await?;
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    /// Records the decision on a pending request.
    pub async fn record_decision(
        &self,
        request_id: &str,
        status: RequestStatus,
        decided_by: &str,
        decided_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> StoreResult<()> {
        debug!(request_id = %request_id, ?status, decided_by = %decided_by, "Recording request decision");
        self.store
            .update(
                STOCK_REQUESTS,
                request_id,
                json!({
                    "status": status,
                    "decidedBy": decided_by,
                    "decidedAt": decided_at,
                    "notes": notes,
                }),
            )
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
