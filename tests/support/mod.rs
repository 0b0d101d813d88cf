#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use food_orderservice::{
    api::{CatalogError, CatalogProvider, ChargeRequest, MenuItem, PaymentError, PaymentProvider},
    app_state::AppState,
    models::{OrderEntity, OrderStatusChangeset, OrderWithItems},
    orders::status::PaymentStatus,
    routes,
    store::{InMemoryOrderStore, NewOrder, OrderStore, Page},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

pub enum CatalogReply {
    Items(Vec<MenuItem>),
    Down,
}

pub struct StubCatalog {
    reply: CatalogReply,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn with_items(items: Vec<MenuItem>) -> Arc<Self> {
        Arc::new(Self {
            reply: CatalogReply::Items(items),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self {
            reply: CatalogReply::Down,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for StubCatalog {
    async fn menu_items(&self, _restaurant_id: i32) -> Result<Vec<MenuItem>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            CatalogReply::Items(items) => Ok(items.clone()),
            CatalogReply::Down => Err(CatalogError::Unavailable("connection refused".into())),
        }
    }
}

pub fn menu_item(item_id: i32, price: Decimal, is_available: bool) -> MenuItem {
    MenuItem {
        item_id,
        price,
        is_available,
    }
}

pub enum PaymentReply {
    Respond(Value),
    Reject(u16, Value),
}

pub struct StubPayments {
    reply: PaymentReply,
    charges: Mutex<Vec<(ChargeRequest, String)>>,
}

impl StubPayments {
    pub fn succeeding() -> Arc<Self> {
        Self::replying(PaymentReply::Respond(
            json!({ "payment": { "status": "SUCCESS", "payment_id": 77 } }),
        ))
    }

    pub fn replying(reply: PaymentReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            charges: Mutex::new(Vec::new()),
        })
    }

    pub fn charges(&self) -> Vec<(ChargeRequest, String)> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for StubPayments {
    async fn charge(
        &self,
        request: &ChargeRequest,
        idempotency_key: &str,
    ) -> Result<Value, PaymentError> {
        self.charges
            .lock()
            .unwrap()
            .push((request.clone(), idempotency_key.to_string()));
        match &self.reply {
            PaymentReply::Respond(body) => Ok(body.clone()),
            PaymentReply::Reject(status, body) => Err(PaymentError::Rejected {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// In-memory store that can be told to fail order creation or the payment
/// status write-back.
#[derive(Default, Clone)]
pub struct FaultyStore {
    pub inner: InMemoryOrderStore,
    pub fail_create: bool,
    pub fail_reconcile: bool,
}

#[async_trait]
impl OrderStore for FaultyStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderEntity> {
        if self.fail_create {
            return Err(anyhow!("connection reset by peer"));
        }
        self.inner.create_order(order).await
    }

    async fn update_payment_status(
        &self,
        order_id: i32,
        status: PaymentStatus,
    ) -> Result<Option<OrderEntity>> {
        if self.fail_reconcile {
            return Err(anyhow!("connection reset by peer"));
        }
        self.inner.update_payment_status(order_id, status).await
    }

    async fn get_by_id(&self, order_id: i32) -> Result<Option<OrderWithItems>> {
        self.inner.get_by_id(order_id).await
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderEntity>> {
        self.inner.list(page).await
    }

    async fn update_statuses(
        &self,
        order_id: i32,
        changes: OrderStatusChangeset,
    ) -> Result<Option<OrderEntity>> {
        self.inner.update_statuses(order_id, changes).await
    }
}

pub fn app(
    store: Arc<dyn OrderStore>,
    catalog: Arc<StubCatalog>,
    payments: Arc<StubPayments>,
) -> Router {
    routes::app(AppState::new(store, catalog, payments, "CARD"))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
