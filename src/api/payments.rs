use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{ChargeRequest, PaymentError, PaymentProvider};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

pub struct PaymentClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl PaymentClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl PaymentProvider for PaymentClient {
    async fn charge(
        &self,
        request: &ChargeRequest,
        idempotency_key: &str,
    ) -> Result<Value, PaymentError> {
        let response = self
            .client
            .post(format!("{}/payments/charge", self.base_url))
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = match text.trim() {
                "" => Value::Null,
                raw => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(text.clone())),
            };
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
