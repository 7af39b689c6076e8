//! Storefront checkout through to the admin live view
//!
//! Wires the full engine over in-memory backends: cart → checkout →
//! store → change feed → live snapshot → status transition.

use async_trait::async_trait;
use order_engine::catalog::{CatalogResult, ProductApi};
use order_engine::orders::{
    CheckoutReceipt, FilterCriteria, OrderError, RedbOrderStore, SyncListener, SyncNotification,
};
use order_engine::storage::MemoryLocalStorage;
use order_engine::{Config, EngineState};
use shared::models::{Product, ProductFilter};
use shared::order::{ChangeEvent, ChangeKind, Customer, OrderStatus};
use std::sync::Arc;
use std::time::Duration;

struct StaticProducts;

fn product(id: &str, name: &str, price: f64) -> Product {
    serde_json::from_value(serde_json::json!({ "id": id, "nombre": name, "precio": price }))
        .unwrap()
}

#[async_trait]
impl ProductApi for StaticProducts {
    async fn list(&self, _filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        Ok(vec![
            product("1", "Arepa de queso", 2500.0),
            product("2", "Bandeja paisa", 4500.0),
        ])
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<Product>> {
        Ok(self
            .list(&ProductFilter::default())
            .await?
            .into_iter()
            .find(|p| p.id == id))
    }
}

fn engine() -> EngineState {
    let mut config = Config::with_work_dir("unused");
    config.webhook_enabled = false;
    EngineState::with_parts(
        &config,
        Arc::new(RedbOrderStore::open_in_memory().unwrap()),
        Arc::new(MemoryLocalStorage::new()),
        Arc::new(StaticProducts),
    )
}

fn ana() -> Customer {
    Customer {
        name: "Ana".into(),
        phone: "3001234567".into(),
        address: "Calle 10 #5-20".into(),
        email: None,
    }
}

/// Next batch of changes, failing on errors or silence
async fn next_changes(listener: &mut SyncListener) -> Vec<ChangeEvent> {
    let notification = tokio::time::timeout(Duration::from_secs(2), listener.recv())
        .await
        .expect("no notification within 2s")
        .expect("listener closed");
    match notification {
        SyncNotification::OrdersUpdated { changes, .. } => changes,
        SyncNotification::Error { message, .. } => panic!("feed error: {}", message),
    }
}

async fn fill_cart(state: &EngineState) {
    for id in ["1", "2"] {
        let product = state.catalog.product(id).await.unwrap().unwrap();
        state.checkout.cart().lock().add(product.to_cart_line(1));
    }
}

#[tokio::test]
async fn test_checkout_reaches_admin_view_and_transitions() {
    let state = engine();
    let mut listener = state.live_sync.listen();
    state.start_live_sync().await.unwrap();
    assert!(next_changes(&mut listener).await.is_empty());

    fill_cart(&state).await;
    assert_eq!(state.checkout.cart().lock().total(), 7000.0);

    let receipt = state.checkout.checkout(ana(), None, None).await.unwrap();
    let CheckoutReceipt::Stored(order) = receipt else {
        panic!("expected the order to be stored");
    };
    assert_eq!(order.total, 7000.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(state.checkout.cart().lock().is_empty());

    let changes = next_changes(&mut listener).await;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Added);
    assert_eq!(changes[0].order.id, order.id);
    assert_eq!(changes[0].order.total, 7000.0);
    assert_eq!(state.live_sync.stats().total_orders, 1);
    assert_eq!(state.live_sync.stats().pending, 1);

    let confirmed = state
        .orders
        .update_status(&order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(confirmed.status_history.contains_key(&OrderStatus::Confirmed));
    assert!(confirmed.updated_at >= order.updated_at);

    let changes = next_changes(&mut listener).await;
    assert_eq!(changes[0].kind, ChangeKind::Modified);
    assert_eq!(changes[0].order.status, OrderStatus::Confirmed);
    assert_eq!(state.live_sync.stats().confirmed, 1);

    let found = state
        .live_sync
        .filtered(&FilterCriteria::new().status(OrderStatus::Confirmed).search("ana"));
    assert_eq!(found.len(), 1);

    state.live_sync.stop();
}

#[tokio::test]
async fn test_illegal_transition_is_rejected() {
    let state = engine();
    fill_cart(&state).await;
    let receipt = state.checkout.checkout(ana(), None, None).await.unwrap();
    let id = receipt.order().id.clone();

    let err = state
        .orders
        .update_status(&id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    state.orders.update_status(&id, OrderStatus::Cancelled).await.unwrap();
    let err = state
        .orders
        .update_status(&id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    let stored = state.orders.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_resubscribe_reconciles_missed_changes() {
    let state = engine();
    let mut listener = state.live_sync.listen();

    fill_cart(&state).await;
    let first = state.checkout.checkout(ana(), None, None).await.unwrap();
    let first_id = first.order().id.clone();

    state.start_live_sync().await.unwrap();
    let initial = next_changes(&mut listener).await;
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].kind, ChangeKind::Added);

    // Changes made while disconnected
    state.live_sync.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    fill_cart(&state).await;
    let second = state.checkout.checkout(ana(), None, None).await.unwrap();
    assert!(state.orders.delete(&first_id).await.unwrap());

    // The stale snapshot is still served until resync
    assert!(state.live_sync.get(&first_id).is_some());

    state.live_sync.resubscribe().await.unwrap();
    let summary: Vec<(ChangeKind, String)> = next_changes(&mut listener)
        .await
        .into_iter()
        .map(|e| (e.kind, e.order.id))
        .collect();

    assert_eq!(
        summary,
        vec![
            (ChangeKind::Added, second.order().id.clone()),
            (ChangeKind::Removed, first_id.clone()),
        ]
    );
    assert_eq!(state.live_sync.len(), 1);
    assert!(state.live_sync.get(&first_id).is_none());
}
