use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewOrder, OrderStore, Page};
use crate::{
    models::{OrderEntity, OrderItemEntity, OrderStatusChangeset, OrderWithItems},
    orders::status::{OrderStatus, PaymentStatus},
};

#[derive(Default)]
struct Tables {
    last_order_id: i32,
    last_order_item_id: i32,
    orders: BTreeMap<i32, OrderEntity>,
    items: Vec<OrderItemEntity>,
}

/// A thread-safe in-memory order store with the same contracts as
/// [`super::PgOrderStore`].
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderEntity> {
        // One write lock for header and lines: readers see all or nothing.
        let mut tables = self.tables.write().await;

        tables.last_order_id += 1;
        let created = OrderEntity {
            order_id: tables.last_order_id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            address_id: order.address_id,
            order_status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            order_total: order.pricing.total,
            tax: order.pricing.tax,
            delivery_fee: order.pricing.delivery_fee,
            created_at: Utc::now(),
        };

        for line in &order.lines {
            tables.last_order_item_id += 1;
            let order_item_id = tables.last_order_item_id;
            tables.items.push(OrderItemEntity {
                order_item_id,
                order_id: created.order_id,
                item_id: line.item_id,
                quantity: line.quantity,
                price: line.price,
            });
        }
        tables.orders.insert(created.order_id, created.clone());

        Ok(created)
    }

    async fn update_payment_status(
        &self,
        order_id: i32,
        status: PaymentStatus,
    ) -> Result<Option<OrderEntity>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&order_id).map(|order| {
            order.payment_status = status;
            order.clone()
        }))
    }

    async fn get_by_id(&self, order_id: i32) -> Result<Option<OrderWithItems>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&order_id).map(|order| OrderWithItems {
            order: order.clone(),
            items: tables
                .items
                .iter()
                .filter(|item| item.order_id == order_id)
                .cloned()
                .collect(),
        }))
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderEntity>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<&OrderEntity> = tables.orders.values().collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_id.cmp(&a.order_id))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(orders.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn update_statuses(
        &self,
        order_id: i32,
        changes: OrderStatusChangeset,
    ) -> Result<Option<OrderEntity>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&order_id).map(|order| {
            if let Some(order_status) = changes.order_status {
                order.order_status = order_status;
            }
            if let Some(payment_status) = changes.payment_status {
                order.payment_status = payment_status;
            }
            order.clone()
        }))
    }
}
