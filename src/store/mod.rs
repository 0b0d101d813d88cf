//! Order persistence. [`OrderStore`] is the only code path that reads or
//! writes orders; the workflow and the routes both go through it.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    models::{OrderEntity, OrderStatusChangeset, OrderWithItems},
    orders::{menu::ValidatedLine, pricing::Pricing, status::PaymentStatus},
};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Everything needed to create an order in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub address_id: i32,
    pub lines: Vec<ValidatedLine>,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// `page` is at least 1, `limit` is clamped to `1..=100` and defaults to 20.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order header and all of its lines atomically. The new order
    /// is `CREATED` / `PENDING`. Nothing is left behind on failure.
    async fn create_order(&self, order: NewOrder) -> Result<OrderEntity>;

    /// Single-row update in its own transaction. `None` if the order is gone.
    async fn update_payment_status(
        &self,
        order_id: i32,
        status: PaymentStatus,
    ) -> Result<Option<OrderEntity>>;

    async fn get_by_id(&self, order_id: i32) -> Result<Option<OrderWithItems>>;

    /// Newest first.
    async fn list(&self, page: Page) -> Result<Vec<OrderEntity>>;

    /// Overwrites only the supplied fields. `None` if the order does not exist.
    async fn update_statuses(
        &self,
        order_id: i32,
        changes: OrderStatusChangeset,
    ) -> Result<Option<OrderEntity>>;
}
