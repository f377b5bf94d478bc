//! # Stock Request Processor
//!
//! Locations raise requests for more stock; managers approve or reject
//! them. Approval is bookkeeping only — stock moves when someone performs
//! the corresponding transfer, never as a side effect of the decision.
//!
//! Decisions are one-shot, and the pending check is a read-check-write
//! against a per-call-atomic store, so decisions on one request serialize
//! on a per-request-id mutex (the ledger's registry discipline).

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use atlas_core::{validation, Operator, RequestStatus, StockRequest};
use atlas_store::{RecordStore, StockRequestRepository};

use crate::error::RequestError;

/// Manages the stock-request lifecycle. Cheap to clone; shares the
/// per-request lock registry.
#[derive(Clone)]
pub struct StockRequestProcessor {
    requests: StockRequestRepository,
    request_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl StockRequestProcessor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        StockRequestProcessor {
            requests: StockRequestRepository::new(store),
            request_locks: Arc::new(DashMap::new()),
        }
    }

    /// The mutex guarding one request's decision state.
    fn lock_for(&self, request_id: &str) -> Arc<Mutex<()>> {
        self.request_locks
            .entry(request_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Raises a new pending request. Any operator may submit.
    pub async fn submit(
        &self,
        location_id: &str,
        item_name: &str,
        quantity: i64,
        reason: &str,
        operator: &Operator,
    ) -> Result<StockRequest, RequestError> {
        validation::validate_location_id(location_id)?;
        let item_name = validation::validate_item_name(item_name)?;
        validation::validate_quantity(quantity)?;
        let reason = validation::validate_reason(reason)?;

        let request = StockRequest {
            id: Uuid::new_v4().to_string(),
            location_id: location_id.to_string(),
            item_name,
            quantity,
            reason,
            status: RequestStatus::Pending,
            requested_by: operator.id.clone(),
            requested_at: Utc::now(),
            decided_by: None,
            decided_at: None,
            notes: None,
        };
        self.requests.insert(&request).await?;

        info!(
            request_id = %request.id,
            location_id,
            quantity,
            requested_by = %operator.id,
            "Stock request submitted"
        );
        Ok(request)
    }

    /// Approves a pending request.
    pub async fn approve(
        &self,
        request_id: &str,
        operator: &Operator,
    ) -> Result<StockRequest, RequestError> {
        self.decide(request_id, RequestStatus::Approved, operator, None)
            .await
    }

    /// Rejects a pending request with reviewer notes.
    pub async fn reject(
        &self,
        request_id: &str,
        operator: &Operator,
        notes: &str,
    ) -> Result<StockRequest, RequestError> {
        let notes = validation::validate_reason(notes)?;
        self.decide(request_id, RequestStatus::Rejected, operator, Some(notes))
            .await
    }

    /// Records a one-shot decision on a pending request.
    async fn decide(
        &self,
        request_id: &str,
        status: RequestStatus,
        operator: &Operator,
        notes: Option<String>,
    ) -> Result<StockRequest, RequestError> {
        // Deciding requests is a stock-movement privilege.
        if !operator.role.can_transfer() {
            return Err(RequestError::NotAuthorized {
                operator_id: operator.id.clone(),
            });
        }

        // Serialize per request id: the pending check below must not race
        // a concurrent decision on the same request.
        let lock = self.lock_for(request_id);
        let _guard = lock.lock().await;

        let mut request = self
            .requests
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| RequestError::NotFound(request_id.to_string()))?;
        if request.status != RequestStatus::Pending {
            return Err(RequestError::AlreadyDecided {
                id: request.id,
                status: request.status,
            });
        }

        let now = Utc::now();
        self.requests
            .record_decision(&request.id, status, &operator.id, now, notes.as_deref())
            .await?;

        request.status = status;
        request.decided_by = Some(operator.id.clone());
        request.decided_at = Some(now);
        request.notes = notes;

        info!(
            request_id = %request.id,
            ?status,
            decided_by = %operator.id,
            "Stock request decided"
        );
        Ok(request)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
