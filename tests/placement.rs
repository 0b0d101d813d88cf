mod support;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use food_orderservice::{
    api::{ChargeRequest, PaymentError, PaymentProvider},
    orders::{
        menu::RequestedItem,
        payment::PaymentOrchestrator,
        placement::{OrderPlacement, PlaceOrder, PlacementError},
        status::PaymentStatus,
    },
    store::{InMemoryOrderStore, OrderStore},
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tokio::sync::Notify;

use support::{StubCatalog, StubPayments, menu_item};

/// Holds every charge until the test lets it through.
#[derive(Default)]
struct GatedPayments {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PaymentProvider for GatedPayments {
    async fn charge(
        &self,
        _request: &ChargeRequest,
        _idempotency_key: &str,
    ) -> Result<Value, PaymentError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(json!({ "payment": { "status": "SUCCESS" } }))
    }
}

fn request(items: Value, client_total: Option<rust_decimal::Decimal>) -> PlaceOrder {
    PlaceOrder {
        customer_id: 1,
        restaurant_id: 2,
        address_id: 3,
        items: serde_json::from_value::<Vec<RequestedItem>>(items).unwrap(),
        client_total,
    }
}

#[tokio::test]
async fn settlement_survives_a_dropped_caller() {
    let store = Arc::new(InMemoryOrderStore::new());
    let payments = Arc::new(GatedPayments::default());
    let placement = OrderPlacement::new(
        StubCatalog::with_items(vec![menu_item(1, dec!(100), true)]),
        store.clone(),
        Arc::new(PaymentOrchestrator::new(payments.clone(), "CARD")),
    );

    let caller = tokio::spawn({
        let placement = placement.clone();
        async move {
            placement
                .place(request(json!([{ "menu_item_id": 1, "quantity": 2 }]), None))
                .await
        }
    });

    payments.entered.notified().await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    let draining = tokio::spawn({
        let placement = placement.clone();
        async move { placement.drain().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!draining.is_finished(), "drain returned while a charge was in flight");
    assert_eq!(
        store.get_by_id(1).await.unwrap().unwrap().order.payment_status,
        PaymentStatus::Pending
    );

    payments.release.notify_one();
    draining.await.unwrap();

    assert_eq!(
        store.get_by_id(1).await.unwrap().unwrap().order.payment_status,
        PaymentStatus::Paid
    );
}

#[tokio::test]
async fn drain_returns_at_once_when_nothing_is_settling() {
    let placement = OrderPlacement::new(
        StubCatalog::with_items(vec![menu_item(1, dec!(100), true)]),
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(PaymentOrchestrator::new(StubPayments::succeeding(), "CARD")),
    );

    placement
        .place(request(json!([{ "menu_item_id": 1, "quantity": 1 }]), None))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(1), placement.drain())
        .await
        .expect("drain should not wait for finished settlements");
}

#[tokio::test]
async fn rejected_requests_never_reach_the_store_or_the_provider() {
    let store = Arc::new(InMemoryOrderStore::new());
    let payments = StubPayments::succeeding();
    let placement = OrderPlacement::new(
        StubCatalog::with_items(vec![menu_item(1, dec!(100), true)]),
        store.clone(),
        Arc::new(PaymentOrchestrator::new(payments.clone(), "CARD")),
    );

    let err = placement
        .place(request(
            json!([{ "menu_item_id": 1, "quantity": 2 }]),
            Some(dec!(230)),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, PlacementError::TotalMismatch { .. }));

    let err = placement
        .place(request(json!([{ "menu_item_id": 1, "quantity": 7 }]), None))
        .await
        .unwrap_err();
    assert!(matches!(err, PlacementError::Rule(_)));

    assert_eq!(store.order_count().await, 0);
    assert!(payments.charges().is_empty());
}

#[tokio::test]
async fn every_placed_order_ends_with_a_payment_verdict() {
    let store = Arc::new(InMemoryOrderStore::new());
    let placement = OrderPlacement::new(
        StubCatalog::with_items(vec![
            menu_item(1, dec!(100), true),
            menu_item(2, dec!(49.99), true),
        ]),
        store.clone(),
        Arc::new(PaymentOrchestrator::new(StubPayments::succeeding(), "CARD")),
    );

    let placed = placement
        .place(request(
            json!([
                { "menu_item_id": 1, "quantity": 1 },
                { "menu_item_id": 2, "quantity": 3 }
            ]),
            Some(dec!(292.47)),
        ))
        .await
        .unwrap();

    // 100 + 3 * 49.99 = 249.97, tax 12.4985 -> 12.50
    assert_eq!(placed.order_total, dec!(292.47));
    assert_eq!(placed.payment_status, PaymentStatus::Paid);
    assert!(placed.reconciled);

    let stored = store.get_by_id(placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.order.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.order.tax, dec!(12.50));
    assert_eq!(stored.items.len(), 2);
}
