use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{CatalogError, CatalogProvider, MenuItem};

pub struct RestaurantClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RestaurantClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl CatalogProvider for RestaurantClient {
    async fn menu_items(&self, restaurant_id: i32) -> Result<Vec<MenuItem>, CatalogError> {
        let response = self
            .client
            .get(format!(
                "{}/restaurants/{}/menu-items",
                self.base_url, restaurant_id
            ))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "GET menu-items for restaurant {} returned {}",
                restaurant_id, status
            )));
        }

        Ok(response.json().await?)
    }
}
