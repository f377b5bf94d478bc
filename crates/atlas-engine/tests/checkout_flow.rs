//! End-to-end checkout behavior over the in-memory store.

use std::sync::Arc;

use serde_json::json;

use atlas_core::{CartLine, ItemTemplate, StockKey};
use atlas_engine::{CheckoutError, Engine};
use atlas_store::store::STOCK;
use atlas_store::{MemoryStore, RecordStore, SaleRepository};

fn template(item_id: &str, price_cents: i64, cost_cents: i64) -> ItemTemplate {
    ItemTemplate {
        item_id: item_id.to_string(),
        name: format!("Item {item_id}"),
        barcode: None,
        category: "Beverages".to_string(),
        cost_cents,
        price_cents,
        min_stock: 2,
        unit: "pieces".to_string(),
    }
}

fn line(item_id: &str, quantity: i64) -> CartLine {
    CartLine {
        item_id: item_id.to_string(),
        price_cents: 1,
        cost_cents: 1,
        quantity,
    }
}

fn engine() -> (Engine, Arc<dyn RecordStore>) {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    (Engine::new(Arc::clone(&store)), store)
}

#[tokio::test]
async fn checkout_debits_and_persists_sale() {
    let (engine, store) = engine();
    let key = StockKey::new("a", "shop1");
    engine.ledger.credit(&key, 10, &template("a", 300, 200)).await.unwrap();

    let sale = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 7)])
        .await
        .unwrap();

    assert_eq!(engine.ledger.get_quantity(&key).await.unwrap(), 3);
    assert_eq!(sale.total_cents, 2100);
    assert_eq!(sale.profit_cents, 700);

    // The sale is durably on record.
    let sales = SaleRepository::new(store);
    let loaded = sales.get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(loaded.cashier_id, "cashier1");
    assert_eq!(loaded.lines.len(), 1);
    assert!(!loaded.voided);
}

#[tokio::test]
async fn second_checkout_fails_when_stock_exhausted() {
    let (engine, _) = engine();
    let key = StockKey::new("a", "shop1");
    engine.ledger.credit(&key, 10, &template("a", 100, 50)).await.unwrap();

    engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 7)])
        .await
        .unwrap();

    let err = engine
        .checkout
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
    // The failed attempt changed nothing.
    assert_eq!(engine.ledger.get_quantity(&key).await.unwrap(), 3);
}

#[tokio::test]
async fn multi_line_cart_is_all_or_nothing() {
    let (engine, _) = engine();
    engine
        .ledger
        .credit(&StockKey::new("a", "shop1"), 10, &template("a", 100, 50))
        .await
        .unwrap();
    engine
        .ledger
        .credit(&StockKey::new("b", "shop1"), 1, &template("b", 200, 100))
        .await
        .unwrap();

    let err = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 4), line("b", 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::StockChanged { .. }));

    // Line a was not debited even though it alone would have succeeded.
    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("a", "shop1"))
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn price_edit_after_sale_never_rewrites_history() {
    let (engine, store) = engine();
    let key = StockKey::new("a", "shop1");
    engine.ledger.credit(&key, 10, &template("a", 250, 100)).await.unwrap();

    let sale = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 2)])
        .await
        .unwrap();
    assert_eq!(sale.total_cents, 500);

    // Inventory maintenance doubles the price afterwards.
    store
        .update(STOCK, &key.record_id(), json!({ "priceCents": 500 }))
        .await
        .unwrap();

    let sales = SaleRepository::new(store);
    let loaded = sales.get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(loaded.total_cents, 500);
    assert_eq!(loaded.lines[0].price_cents, 250);

    // A new sale sees the new price.
    let next = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 2)])
        .await
        .unwrap();
    assert_eq!(next.total_cents, 1000);
}

#[tokio::test]
async fn retired_item_is_not_sellable() {
    let (engine, _) = engine();
    let key = StockKey::new("a", "shop1");
    engine.ledger.credit(&key, 4, &template("a", 100, 50)).await.unwrap();
    engine.ledger.retire(&key).await.unwrap();

    let err = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::StockChanged { available: 0, .. }
    ));
    // The leftover quantity is untouched, just out of circulation.
    let record = engine.ledger.get_record(&key).await.unwrap().unwrap();
    assert_eq!(record.quantity, 4);
    assert!(!record.is_active);
}

#[tokio::test]
async fn empty_and_malformed_carts_rejected() {
    let (engine, _) = engine();
    engine
        .ledger
        .credit(&StockKey::new("a", "shop1"), 10, &template("a", 100, 50))
        .await
        .unwrap();

    let err = engine
        .checkout
        .checkout("shop1", "cashier1", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));

    let err = engine
        .checkout
        .checkout("shop1", "cashier1", &[line("a", 1), line("a", 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidCart(_)));

    // Neither attempt touched the counter.
    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("a", "shop1"))
            .await
            .unwrap(),
        10
    );
}
