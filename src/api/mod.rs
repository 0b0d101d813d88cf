//! Clients for the services this one depends on: the restaurant service
//! (live menus) and the payment service (charges).

pub mod payments;
pub mod restaurants;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One entry of a restaurant's live menu. Extra fields sent by the
/// restaurant service are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MenuItem {
    pub item_id: i32,
    pub price: Decimal,
    #[serde(default)]
    pub is_available: bool,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("restaurant service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("restaurant service unavailable: {0}")]
    Unavailable(String),
}

/// Source of live menu data. Every call is a fresh read; nothing is cached.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn menu_items(&self, restaurant_id: i32) -> Result<Vec<MenuItem>, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    pub order_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment service rejected the charge with status {status}")]
    Rejected { status: u16, body: Value },
}

impl PaymentError {
    /// What the caller gets to see about a failed charge.
    pub fn diagnostics(&self) -> Value {
        match self {
            Self::Rejected { body, .. } if !body.is_null() => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// A payment service able to take a single charge attempt.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Returns the provider's response body on any 2xx response.
    async fn charge(
        &self,
        request: &ChargeRequest,
        idempotency_key: &str,
    ) -> Result<Value, PaymentError>;
}
