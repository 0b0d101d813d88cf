use std::sync::Arc;

use reqwest::Client;

use crate::{
    api::{
        CatalogProvider, PaymentProvider, payments::PaymentClient, restaurants::RestaurantClient,
    },
    config::AppConfig,
    db::DbPool,
    orders::{payment::PaymentOrchestrator, placement::OrderPlacement},
    store::{OrderStore, PgOrderStore},
};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub placement: OrderPlacement,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogProvider>,
        payments: Arc<dyn PaymentProvider>,
        payment_method: impl Into<String>,
    ) -> Self {
        let orchestrator = Arc::new(PaymentOrchestrator::new(payments, payment_method));
        Self {
            placement: OrderPlacement::new(catalog, orders.clone(), orchestrator),
            orders,
        }
    }

    /// Production wiring: Postgres store plus HTTP clients for the
    /// restaurant and payment services.
    pub fn from_config(config: &AppConfig, db_pool: DbPool, http_client: Client) -> Self {
        let restaurants = RestaurantClient::new(
            http_client.clone(),
            config.restaurant_service.url.clone(),
            config.restaurant_service.timeout(),
        );
        let payments = PaymentClient::new(
            http_client,
            config.payment_service.url.clone(),
            config.payment_service.timeout(),
        );

        Self::new(
            Arc::new(PgOrderStore::new(db_pool)),
            Arc::new(restaurants),
            Arc::new(payments),
            config.payment_service.payment_method.clone(),
        )
    }
}
