//! Checks requested lines against a restaurant's live menu.
//!
//! Rules run in a fixed order and the first violation wins:
//! item count, non-empty menu, per-line quantity, item existence, item availability.
//! Prices always come from the menu, never from the request.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::api::MenuItem;

pub const MAX_ITEMS: usize = 20;
pub const MAX_QUANTITY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct RequestedItem {
    pub menu_item_id: i32,
    /// Read loosely so that a bad quantity is reported as a rule violation
    /// after the item count check, not as a malformed body.
    #[serde(default)]
    #[schema(value_type = i64, minimum = 1, maximum = 5)]
    pub quantity: Value,
    /// Advisory only; the menu price is what gets charged and stored.
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

/// A line that passed every rule, priced from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedLine {
    pub item_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Items must be 1-20 per order, got {0}")]
    ItemCount(usize),
    #[error("Restaurant {0} is closed or has no menu")]
    NoMenu(i32),
    #[error("Each line quantity must be 1..5 (item {menu_item_id})")]
    Quantity { menu_item_id: i32 },
    #[error("Item {item_id} does not exist in restaurant {restaurant_id}")]
    UnknownItem { item_id: i32, restaurant_id: i32 },
    #[error("Item {0} is unavailable")]
    Unavailable(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatalogEntry {
    is_available: bool,
    price: Decimal,
}

/// A restaurant's menu as read for one placement request.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: HashMap<i32, CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<Vec<MenuItem>> for CatalogSnapshot {
    fn from(items: Vec<MenuItem>) -> Self {
        let entries = items
            .into_iter()
            .map(|item| {
                (
                    item.item_id,
                    CatalogEntry {
                        is_available: item.is_available,
                        price: item.price,
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

pub fn check_item_count(items: &[RequestedItem]) -> Result<(), RuleViolation> {
    if items.is_empty() || items.len() > MAX_ITEMS {
        return Err(RuleViolation::ItemCount(items.len()));
    }
    Ok(())
}

pub fn validate(
    restaurant_id: i32,
    items: &[RequestedItem],
    catalog: &CatalogSnapshot,
) -> Result<Vec<ValidatedLine>, RuleViolation> {
    check_item_count(items)?;
    if catalog.is_empty() {
        return Err(RuleViolation::NoMenu(restaurant_id));
    }

    items
        .iter()
        .map(|item| {
            let quantity = whole_quantity(&item.quantity)
                .filter(|q| (1..=MAX_QUANTITY).contains(q))
                .ok_or(RuleViolation::Quantity {
                    menu_item_id: item.menu_item_id,
                })?;

            let entry = catalog
                .entries
                .get(&item.menu_item_id)
                .ok_or(RuleViolation::UnknownItem {
                    item_id: item.menu_item_id,
                    restaurant_id,
                })?;
            if !entry.is_available {
                return Err(RuleViolation::Unavailable(item.menu_item_id));
            }

            if let Some(client_price) = item.price {
                if client_price != entry.price {
                    tracing::debug!(
                        item_id = item.menu_item_id,
                        %client_price,
                        menu_price = %entry.price,
                        "Ignoring client price that differs from the menu"
                    );
                }
            }

            Ok(ValidatedLine {
                item_id: item.menu_item_id,
                quantity: quantity as i32,
                price: entry.price,
            })
        })
        .collect()
}

/// `2`, `2.0` and `"2"` are whole quantities. `2.5`, `null`, `true` and
/// non-numeric strings are not.
fn whole_quantity(quantity: &Value) -> Option<i64> {
    match quantity {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_f64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_f64))
        }
        _ => None,
    }
}

fn whole_f64(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64)
        .then_some(value as i64)
}
