use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use super::status::PaymentStatus;
use crate::api::{ChargeRequest, PaymentError, PaymentProvider};

pub const CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeVerdict {
    Success,
    Failed,
}

/// Result of one charge attempt, with whatever the provider said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub verdict: ChargeVerdict,
    pub detail: Value,
}

impl PaymentOutcome {
    /// Provider responses are `SUCCESS` only when they say so explicitly.
    pub fn classify(response: Value) -> Self {
        let verdict = match response.pointer("/payment/status").and_then(Value::as_str) {
            Some("SUCCESS") => ChargeVerdict::Success,
            _ => ChargeVerdict::Failed,
        };
        Self {
            verdict,
            detail: response,
        }
    }

    pub fn from_error(err: &PaymentError) -> Self {
        Self {
            verdict: ChargeVerdict::Failed,
            detail: json!({ "error": err.diagnostics() }),
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self.verdict {
            ChargeVerdict::Success => PaymentStatus::Paid,
            ChargeVerdict::Failed => PaymentStatus::PaymentFailed,
        }
    }
}

/// Issues exactly one charge per placed order. Retries are out of its hands.
pub struct PaymentOrchestrator {
    provider: Arc<dyn PaymentProvider>,
    payment_method: String,
}

impl PaymentOrchestrator {
    pub fn new(provider: Arc<dyn PaymentProvider>, payment_method: impl Into<String>) -> Self {
        Self {
            provider,
            payment_method: payment_method.into(),
        }
    }

    /// Declines come back as `Ok` with a failed verdict; only transport and
    /// non-2xx failures are errors.
    pub async fn charge(
        &self,
        order_id: i32,
        amount: Decimal,
    ) -> Result<PaymentOutcome, PaymentError> {
        let key = idempotency_key(order_id, Utc::now());
        let request = ChargeRequest {
            order_id,
            amount,
            currency: CURRENCY.to_string(),
            payment_method: self.payment_method.clone(),
        };

        tracing::debug!(order_id, %amount, idempotency_key = %key, "Charging order");
        let response = self.provider.charge(&request, &key).await?;
        Ok(PaymentOutcome::classify(response))
    }
}

/// Scoped to one placement request: a resend after a timeout gets a new key.
pub fn idempotency_key(order_id: i32, at: DateTime<Utc>) -> String {
    format!("order-{}-{}", order_id, at.timestamp_millis())
}
