//! # Checkout Processor
//!
//! Turns a cart into a committed, frozen [`Sale`].
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Validate cart shape (no I/O; failure mutates nothing)               │
//! │  2. Ledger: lock every line's key in sorted order, re-read fresh,       │
//! │     debit all lines or none                                             │
//! │  3. Snapshot prices from the fresh records (never from the cart)        │
//! │  4. Write the Sale record                                               │
//! │     └── on failure: credit every debit back, report Persistence         │
//! │         └── if a credit fails too: ReconciliationRequired               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Between step 2 and the remainder there is no window in which another
//! checkout can observe the debited quantities inconsistently — the debits
//! are final the moment the ledger applies them; only the sale record write
//! can still fail, and that path compensates.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use atlas_core::{cart, CartLine, Sale, SaleLine, StockKey};
use atlas_store::{Reconciliation, RecordStore, SaleRepository, StockLedger, StoreError};

use crate::error::CheckoutError;

/// Commits carts as sales. Cheap to clone; shares the ledger.
#[derive(Clone)]
pub struct CheckoutProcessor {
    ledger: Arc<StockLedger>,
    sales: SaleRepository,
}

impl CheckoutProcessor {
    pub fn new(ledger: Arc<StockLedger>, store: Arc<dyn RecordStore>) -> Self {
        CheckoutProcessor {
            ledger,
            sales: SaleRepository::new(store),
        }
    }

    /// Commits a cart at `location_id`, returning the frozen sale.
    ///
    /// On any error the system holds: either no counter changed, or every
    /// debit was credited back (`Persistence`), or the partial state is
    /// reported (`ReconciliationRequired`). A sale record exists iff all
    /// debits stand.
    pub async fn checkout(
        &self,
        location_id: &str,
        cashier_id: &str,
        lines: &[CartLine],
    ) -> Result<Sale, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        atlas_core::validation::validate_location_id(location_id)?;
        cart::validate_cart(lines)?;

        // All-or-nothing debit; returns the pre-debit records in cart order.
        let requests: Vec<(String, i64)> = lines
            .iter()
            .map(|line| (line.item_id.clone(), line.quantity))
            .collect();
        let fresh = self.ledger.commit_cart_debits(location_id, &requests).await?;

        // Freeze prices from the fresh records, never from the cart.
        let sale_lines: Vec<SaleLine> = lines
            .iter()
            .zip(&fresh)
            .map(|(line, record)| cart::snapshot_line(line, record))
            .collect();
        let (total, profit) = cart::totals(&sale_lines);

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            location_id: location_id.to_string(),
            lines: sale_lines,
            total_cents: total.cents(),
            profit_cents: profit.cents(),
            cashier_id: cashier_id.to_string(),
            created_at: Utc::now(),
            voided: false,
            voided_by: None,
            void_reason: None,
            voided_at: None,
        };

        if let Err(store_err) = self.sales.insert(&sale).await {
            return Err(self.undo_debits(&sale, store_err).await);
        }

        info!(
            sale_id = %sale.id,
            location_id,
            cashier_id,
            lines = sale.lines.len(),
            total = %sale.total(),
            "Checkout committed"
        );
        Ok(sale)
    }

    /// Credits every debited line back after the sale record write failed.
    ///
    /// The debits are already durable, so this runs line by line; a failure
    /// partway leaves counters short and must surface as reconciliation.
    async fn undo_debits(&self, sale: &Sale, cause: StoreError) -> CheckoutError {
        let keys: Vec<String> = sale
            .lines
            .iter()
            .map(|line| format!("{}@{}", line.item_id, sale.location_id))
            .collect();
        let mut completed: Vec<String> = sale
            .lines
            .iter()
            .map(|line| format!("debit {}@{} {}", line.item_id, sale.location_id, line.quantity))
            .collect();

        for line in &sale.lines {
            let key = StockKey::new(line.item_id.clone(), sale.location_id.clone());
            if let Err(credit_err) = self
                .ledger
                .credit(&key, line.quantity, &line.restock_template())
                .await
            {
                let reconciliation = Reconciliation {
                    operation: "checkout".to_string(),
                    keys,
                    completed,
                    cause: format!("{cause}; compensation failed: {credit_err}"),
                };
                error!(%reconciliation, "Checkout compensation failed");
                return CheckoutError::ReconciliationRequired(reconciliation);
            }
            completed.push(format!(
                "compensated {}@{} {}",
                line.item_id, sale.location_id, line.quantity
            ));
        }

        warn!(
            location_id = %sale.location_id,
            %cause,
            "Checkout rolled back after sale record write failed"
        );
        CheckoutError::Persistence(cause)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::ItemTemplate;
    use atlas_store::MemoryStore;

    fn template(item_id: &str, price_cents: i64, cost_cents: i64) -> ItemTemplate {
        ItemTemplate {
            item_id: item_id.to_string(),
            name: format!("Item {item_id}"),
            barcode: None,
            category: "Beverages".to_string(),
            cost_cents,
            price_cents,
            min_stock: 0,
            unit: "pieces".to_string(),
        }
    }

    fn line(item_id: &str, quantity: i64) -> CartLine {
        CartLine {
            item_id: item_id.to_string(),
            price_cents: 1, // stale display price; must not leak into the sale
            cost_cents: 1,
            quantity,
        }
    }

    async fn processor() -> (CheckoutProcessor, Arc<StockLedger>) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(StockLedger::new(Arc::clone(&store)));
        (
            CheckoutProcessor::new(Arc::clone(&ledger), store),
            ledger,
        )
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_io() {
        let (processor, _) = processor().await;
        let err = processor.checkout("shop1", "cashier1", &[]).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_checkout_freezes_record_prices() {
        let (processor, ledger) = processor().await;
        let key = StockKey::new("a", "shop1");
        ledger.credit(&key, 10, &template("a", 250, 100)).await.unwrap();

        let sale = processor
            .checkout("shop1", "cashier1", &[line("a", 4)])
            .await
            .unwrap();

        assert_eq!(sale.lines[0].price_cents, 250);
        assert_eq!(sale.lines[0].cost_cents, 100);
        assert_eq!(sale.total_cents, 1000);
        assert_eq!(sale.profit_cents, 600);
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_overdraw_is_stock_changed_and_mutates_nothing() {
        let (processor, ledger) = processor().await;
        let key = StockKey::new("a", "shop1");
        ledger.credit(&key, 3, &template("a", 100, 50)).await.unwrap();

        let err = processor
            .checkout("shop1", "cashier1", &[line("a", 5)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::StockChanged {
                available: 3,
                requested: 5,
                ..
            }
        ));
        assert_eq!(ledger.get_quantity(&key).await.unwrap(), 3);
    }
}
