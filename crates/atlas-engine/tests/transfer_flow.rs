//! End-to-end transfer behavior: conservation, template copying, audit.

use std::sync::Arc;

use atlas_core::{ItemTemplate, Operator, Role, StockKey};
use atlas_engine::{Engine, TransferError};
use atlas_store::{MemoryStore, RecordStore, TransferRepository};

fn template(item_id: &str) -> ItemTemplate {
    ItemTemplate {
        item_id: item_id.to_string(),
        name: format!("Item {item_id}"),
        barcode: Some("789".to_string()),
        category: "Dairy".to_string(),
        cost_cents: 80,
        price_cents: 130,
        min_stock: 6,
        unit: "pieces".to_string(),
    }
}

fn engine() -> (Engine, Arc<dyn RecordStore>) {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    (Engine::new(Arc::clone(&store)), store)
}

#[tokio::test]
async fn transfer_conserves_total_stock() {
    let (engine, store) = engine();
    let source = StockKey::new("z", "warehouse");
    engine.ledger.credit(&source, 20, &template("z")).await.unwrap();

    let manager = Operator::new("manager1", Role::Manager);
    let transfer = engine
        .transfers
        .transfer("z", "warehouse", "shop1", 5, &manager)
        .await
        .unwrap();

    let dest = StockKey::new("z", "shop1");
    let at_source = engine.ledger.get_quantity(&source).await.unwrap();
    let at_dest = engine.ledger.get_quantity(&dest).await.unwrap();
    assert_eq!(at_source, 15);
    assert_eq!(at_dest, 5);
    assert_eq!(at_source + at_dest, 20);

    // The audit record is durable and names both endpoints.
    let log = TransferRepository::new(store);
    let loaded = log.get_by_id(&transfer.id).await.unwrap().unwrap();
    assert_eq!(loaded.from_location_id, "warehouse");
    assert_eq!(loaded.to_location_id, "shop1");
    assert_eq!(loaded.quantity, 5);
    assert_eq!(loaded.operator_id, "manager1");
}

#[tokio::test]
async fn first_transfer_materializes_destination_record() {
    let (engine, _) = engine();
    engine
        .ledger
        .credit(&StockKey::new("z", "warehouse"), 20, &template("z"))
        .await
        .unwrap();

    let manager = Operator::new("manager1", Role::Manager);
    engine
        .transfers
        .transfer("z", "warehouse", "shop1", 7, &manager)
        .await
        .unwrap();

    let dest = engine
        .ledger
        .get_record(&StockKey::new("z", "shop1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dest.quantity, 7);
    assert_eq!(dest.name, "Item z");
    assert_eq!(dest.barcode.as_deref(), Some("789"));
    assert_eq!(dest.category, "Dairy");
    assert_eq!(dest.cost_cents, 80);
    assert_eq!(dest.price_cents, 130);
    assert_eq!(dest.min_stock, 6);
    assert!(dest.is_active);
}

#[tokio::test]
async fn repeated_transfers_accumulate_at_destination() {
    let (engine, _) = engine();
    engine
        .ledger
        .credit(&StockKey::new("z", "warehouse"), 20, &template("z"))
        .await
        .unwrap();
    let manager = Operator::new("manager1", Role::Manager);

    engine
        .transfers
        .transfer("z", "warehouse", "shop1", 4, &manager)
        .await
        .unwrap();
    engine
        .transfers
        .transfer("z", "warehouse", "shop1", 6, &manager)
        .await
        .unwrap();

    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("z", "shop1"))
            .await
            .unwrap(),
        10
    );
    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("z", "warehouse"))
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn retired_source_cannot_be_transferred() {
    let (engine, _) = engine();
    let source = StockKey::new("z", "warehouse");
    engine.ledger.credit(&source, 20, &template("z")).await.unwrap();
    engine.ledger.retire(&source).await.unwrap();

    let manager = Operator::new("manager1", Role::Manager);
    let err = engine
        .transfers
        .transfer("z", "warehouse", "shop1", 5, &manager)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientStock { available: 0, .. }
    ));
    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("z", "shop1"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn invalid_transfers_rejected_without_mutation() {
    let (engine, _) = engine();
    let source = StockKey::new("z", "warehouse");
    engine.ledger.credit(&source, 20, &template("z")).await.unwrap();
    let manager = Operator::new("manager1", Role::Manager);
    let cashier = Operator::new("cashier1", Role::Cashier);

    let err = engine
        .transfers
        .transfer("z", "warehouse", "warehouse", 5, &manager)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::SameLocation));

    let err = engine
        .transfers
        .transfer("z", "warehouse", "shop1", 0, &manager)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidQuantity { .. }));

    let err = engine
        .transfers
        .transfer("z", "warehouse", "shop1", 25, &manager)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientStock {
            available: 20,
            requested: 25,
            ..
        }
    ));

    let err = engine
        .transfers
        .transfer("z", "warehouse", "shop1", 5, &cashier)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NotAuthorized { .. }));

    assert_eq!(engine.ledger.get_quantity(&source).await.unwrap(), 20);
    assert_eq!(
        engine
            .ledger
            .get_quantity(&StockKey::new("z", "shop1"))
            .await
            .unwrap(),
        0
    );
}
