use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orders::status::{OrderStatus, PaymentStatus};

// Orders

#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub order_id: i32,
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub address_id: i32,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub address_id: i32,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub order_total: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
}

/// Partial status update. `None` fields are left untouched.
#[derive(AsChangeset, Deserialize, Debug, Clone, Copy, Default, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderStatusChangeset {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderStatusChangeset {
    pub fn is_empty(&self) -> bool {
        self.order_status.is_none() && self.payment_status.is_none()
    }
}

// Order items

#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub order_item_id: i32,
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

/// An order row together with its line items, as returned by `GET /orders/{id}`.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderEntity,
    pub items: Vec<OrderItemEntity>,
}
