//! End-to-end order placement.
//!
//! `RECEIVED -> VALIDATING -> PRICING -> PERSISTING -> CREATED -> CHARGING -> RECONCILED`
//!
//! Anything that fails before `CREATED` leaves no row behind. From `CREATED` on,
//! the order exists no matter what happens to the payment: a failed charge is
//! recorded as `PAYMENT_FAILED` and reported to the caller as data.

use std::{fmt, sync::Arc};

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, warn};
use utoipa::ToSchema;

use super::{
    menu::{self, CatalogSnapshot, RequestedItem, RuleViolation},
    payment::{PaymentOrchestrator, PaymentOutcome},
    pricing::{self, PricingError},
    status::PaymentStatus,
};
use crate::{
    api::{CatalogError, CatalogProvider},
    store::{NewOrder, OrderStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    Received,
    Validating,
    Pricing,
    Persisting,
    Created,
    Charging,
    Reconciled,
}

impl fmt::Display for PlacementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Received => "RECEIVED",
            Self::Validating => "VALIDATING",
            Self::Pricing => "PRICING",
            Self::Persisting => "PERSISTING",
            Self::Created => "CREATED",
            Self::Charging => "CHARGING",
            Self::Reconciled => "RECONCILED",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub address_id: i32,
    pub items: Vec<RequestedItem>,
    pub client_total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_total: Decimal,
    pub payment_status: PaymentStatus,
    /// Provider response, or `{"error": ...}` when the charge did not go through.
    pub payment: Value,
    /// `false` when the payment verdict could not be written back to the order.
    pub reconciled: bool,
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("Client total {client} does not match server calculation {server}")]
    TotalMismatch { client: Decimal, server: Decimal },
    #[error("Failed to fetch menu items")]
    Catalog(#[source] CatalogError),
    #[error("Failed to persist order")]
    Persistence(#[source] anyhow::Error),
    #[error("Payment settlement did not complete")]
    Settlement(#[source] JoinError),
}

struct Settlement {
    outcome: PaymentOutcome,
    reconciled: bool,
}

#[derive(Clone)]
pub struct OrderPlacement {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn OrderStore>,
    payments: Arc<PaymentOrchestrator>,
    settlements: TaskTracker,
}

impl OrderPlacement {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn OrderStore>,
        payments: Arc<PaymentOrchestrator>,
    ) -> Self {
        Self {
            catalog,
            store,
            payments,
            settlements: TaskTracker::new(),
        }
    }

    /// Waits for every settlement already started, including those whose
    /// caller has gone away. Call once the server stops accepting requests.
    pub async fn drain(&self) {
        self.settlements.close();
        if !self.settlements.is_empty() {
            info!(pending = self.settlements.len(), "Waiting for in-flight settlements");
        }
        self.settlements.wait().await;
    }

    #[tracing::instrument(
        name = "place_order",
        skip_all,
        fields(restaurant_id = request.restaurant_id, customer_id = request.customer_id)
    )]
    pub async fn place(&self, request: PlaceOrder) -> Result<PlacedOrder, PlacementError> {
        debug!(stage = %PlacementStage::Received, items = request.items.len());

        debug!(stage = %PlacementStage::Validating);
        menu::check_item_count(&request.items)?;
        let catalog = CatalogSnapshot::from(
            self.catalog
                .menu_items(request.restaurant_id)
                .await
                .map_err(PlacementError::Catalog)?,
        );
        debug!(menu_items = catalog.len(), "Fetched menu");
        let lines = menu::validate(request.restaurant_id, &request.items, &catalog)?;

        debug!(stage = %PlacementStage::Pricing);
        let pricing = pricing::price(&lines)?;
        if let Some(client_total) = request.client_total {
            if !pricing::matches_client_total(&pricing, client_total) {
                return Err(PlacementError::TotalMismatch {
                    client: client_total,
                    server: pricing.total,
                });
            }
        }

        debug!(stage = %PlacementStage::Persisting);
        let order = self
            .store
            .create_order(NewOrder {
                customer_id: request.customer_id,
                restaurant_id: request.restaurant_id,
                address_id: request.address_id,
                lines,
                pricing,
            })
            .await
            .map_err(PlacementError::Persistence)?;
        info!(
            order_id = order.order_id,
            stage = %PlacementStage::Created,
            order_total = %order.order_total,
            "Order committed"
        );

        // Tracked rather than awaited inline: a client hanging up must not stop
        // the charge or the reconciliation once the order exists.
        let settlement = self.settlements.spawn(
            settle(
                self.payments.clone(),
                self.store.clone(),
                order.order_id,
                order.order_total,
            )
            .in_current_span(),
        )
        .await
        .map_err(PlacementError::Settlement)?;

        Ok(PlacedOrder {
            order_id: order.order_id,
            order_total: order.order_total,
            payment_status: settlement.outcome.payment_status(),
            payment: settlement.outcome.detail,
            reconciled: settlement.reconciled,
        })
    }
}

async fn settle(
    payments: Arc<PaymentOrchestrator>,
    store: Arc<dyn OrderStore>,
    order_id: i32,
    amount: Decimal,
) -> Settlement {
    debug!(order_id, stage = %PlacementStage::Charging);
    let outcome = match payments.charge(order_id, amount).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(order_id, "Payment failed for order: {}", err);
            PaymentOutcome::from_error(&err)
        }
    };

    let status = outcome.payment_status();
    let reconciled = match store.update_payment_status(order_id, status).await {
        Ok(Some(_)) => {
            info!(order_id, payment_status = %status, stage = %PlacementStage::Reconciled, "Order reconciled");
            true
        }
        Ok(None) => {
            error!(order_id, payment_status = %status, "Order disappeared before reconciliation; needs manual repair");
            false
        }
        Err(err) => {
            error!(order_id, payment_status = %status, "Failed to record payment status; order left PENDING, needs manual repair: {:#}", err);
            false
        }
    };

    Settlement {
        outcome,
        reconciled,
    }
}
