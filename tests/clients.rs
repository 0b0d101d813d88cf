use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use food_orderservice::api::{
    CatalogError, CatalogProvider, ChargeRequest, PaymentError, PaymentProvider,
    payments::PaymentClient, restaurants::RestaurantClient,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn charge_request() -> ChargeRequest {
    ChargeRequest {
        order_id: 12,
        amount: dec!(240.50),
        currency: "INR".into(),
        payment_method: "CARD".into(),
    }
}

#[tokio::test]
async fn restaurant_client_reads_menu_items() {
    let router = Router::new().route(
        "/v1/restaurants/{id}/menu-items",
        get(|Path(id): Path<i32>| async move {
            assert_eq!(id, 4);
            Json(json!([
                { "item_id": 1, "name": "Paneer Roll", "price": "120.50", "is_available": true },
                { "item_id": 2, "name": "Lassi", "price": 60, "is_available": false },
                { "item_id": 3, "name": "Samosa", "price": 25.5 }
            ]))
        }),
    );
    let base_url = spawn_server(router).await;
    let client = RestaurantClient::new(reqwest::Client::new(), base_url, Duration::from_secs(2));

    let items = client.menu_items(4).await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].price, dec!(120.50));
    assert!(items[0].is_available);
    assert_eq!(items[1].price, dec!(60));
    assert!(!items[1].is_available);
    assert_eq!(items[2].price, dec!(25.5));
    assert!(!items[2].is_available);
}

#[tokio::test]
async fn restaurant_client_reports_server_errors() {
    let router = Router::new().route(
        "/v1/restaurants/{id}/menu-items",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let base_url = spawn_server(router).await;
    let client = RestaurantClient::new(reqwest::Client::new(), base_url, Duration::from_secs(2));

    let err = client.menu_items(4).await.unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(_)));
}

#[derive(Default)]
struct Captured {
    key: Option<String>,
    body: Option<Value>,
}

#[tokio::test]
async fn payment_client_sends_idempotency_key_and_body() {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let router = Router::new()
        .route(
            "/v1/payments/charge",
            post(
                |State(captured): State<Arc<Mutex<Captured>>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let mut captured = captured.lock().unwrap();
                    captured.key = headers
                        .get("Idempotency-Key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.body = Some(body);
                    Json(json!({ "payment": { "status": "SUCCESS", "payment_id": 9 } }))
                },
            ),
        )
        .with_state(captured.clone());
    let base_url = spawn_server(router).await;
    let client = PaymentClient::new(reqwest::Client::new(), base_url, Duration::from_secs(2));

    let response = client
        .charge(&charge_request(), "order-12-1700000000000")
        .await
        .unwrap();

    assert_eq!(response["payment"]["status"], "SUCCESS");
    let captured = captured.lock().unwrap();
    assert_eq!(captured.key.as_deref(), Some("order-12-1700000000000"));
    assert_eq!(
        captured.body,
        Some(json!({
            "order_id": 12,
            "amount": 240.5,
            "currency": "INR",
            "payment_method": "CARD"
        }))
    );
}

#[tokio::test]
async fn payment_client_keeps_the_body_of_a_rejection() {
    let router = Router::new().route(
        "/v1/payments/charge",
        post(|| async {
            (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({ "code": "DECLINED", "message": "card declined" })),
            )
        }),
    );
    let base_url = spawn_server(router).await;
    let client = PaymentClient::new(reqwest::Client::new(), base_url, Duration::from_secs(2));

    let err = client.charge(&charge_request(), "k").await.unwrap_err();

    match err {
        PaymentError::Rejected { status, body } => {
            assert_eq!(status, 402);
            assert_eq!(body["message"], "card declined");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn payment_client_gives_up_after_its_timeout() {
    let router = Router::new().route(
        "/v1/payments/charge",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "payment": { "status": "SUCCESS" } }))
        }),
    );
    let base_url = spawn_server(router).await;
    let client = PaymentClient::new(reqwest::Client::new(), base_url, Duration::from_millis(100));

    let err = client.charge(&charge_request(), "k").await.unwrap_err();

    match err {
        PaymentError::Transport(err) => assert!(err.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}
