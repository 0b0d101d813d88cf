use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{NewOrder, OrderStore, Page};
use crate::{
    db::DbPool,
    models::{
        CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity,
        OrderStatusChangeset, OrderWithItems,
    },
    orders::status::{OrderStatus, PaymentStatus},
    schema::{order_items, orders},
};

/// Postgres-backed store. Holds the pool injected at startup.
#[derive(Clone)]
pub struct PgOrderStore {
    db_pool: DbPool,
}

impl PgOrderStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderEntity> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        // The connection goes back to the pool committed or rolled back on
        // every exit path, including errors halfway through the lines.
        conn.transaction(move |conn| {
            Box::pin(async move {
                let created: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        customer_id: order.customer_id,
                        restaurant_id: order.restaurant_id,
                        address_id: order.address_id,
                        order_status: OrderStatus::Created,
                        payment_status: PaymentStatus::Pending,
                        order_total: order.pricing.total,
                        tax: order.pricing.tax,
                        delivery_fee: order.pricing.delivery_fee,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let lines: Vec<CreateOrderItemEntity> = order
                    .lines
                    .iter()
                    .map(|line| CreateOrderItemEntity {
                        order_id: created.order_id,
                        item_id: line.item_id,
                        quantity: line.quantity,
                        price: line.price,
                    })
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(lines)
                    .execute(conn)
                    .await
                    .context("Failed to create order items")?;

                Ok::<OrderEntity, anyhow::Error>(created)
            })
        })
        .await
        .context("Transaction failed")
    }

    async fn update_payment_status(
        &self,
        order_id: i32,
        status: PaymentStatus,
    ) -> Result<Option<OrderEntity>> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::update(orders::table.find(order_id))
            .set(orders::payment_status.eq(status))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update payment status")
    }

    async fn get_by_id(&self, order_id: i32) -> Result<Option<OrderWithItems>> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let order: Option<OrderEntity> = orders::table
            .find(order_id)
            .select(OrderEntity::as_select())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items: Vec<OrderItemEntity> = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .order_by(order_items::order_item_id.asc())
            .select(OrderItemEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get order items")?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderEntity>> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        orders::table
            .order_by((orders::created_at.desc(), orders::order_id.desc()))
            .limit(page.limit)
            .offset(page.offset())
            .select(OrderEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to list orders")
    }

    async fn update_statuses(
        &self,
        order_id: i32,
        changes: OrderStatusChangeset,
    ) -> Result<Option<OrderEntity>> {
        if changes.is_empty() {
            return Ok(self.get_by_id(order_id).await?.map(|found| found.order));
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::update(orders::table.find(order_id))
            .set(&changes)
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update order")
    }
}
