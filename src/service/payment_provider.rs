// service/payment_provider.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("[{code}] {message}")]
pub struct GatewayError {
    pub code: String,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeReceipt {
    // Provider correlation id (Stripe PaymentIntent id)
    pub provider_id: String,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutReceipt {
    // Provider correlation id (Stripe Transfer id)
    pub provider_id: String,
    pub outcome: PaymentOutcome,
}

/// The two money movements the settlement workflow needs. Implemented by
/// Stripe in production and by in-memory mocks in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Debit the payer's stored payment method.
    async fn charge_customer(
        &self,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
        reference: &str,
        metadata: &[(String, String)],
    ) -> Result<ChargeReceipt, GatewayError>;

    /// Credit the worker's connected payout account.
    async fn pay_worker(
        &self,
        payout_account_id: &str,
        amount_cents: i64,
        description: &str,
        reference: &str,
    ) -> Result<PayoutReceipt, GatewayError>;
}

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: &Config) -> Self {
        StripeGateway {
            secret_key: config.stripe_secret_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", STRIPE_API_BASE, path))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .header("Idempotency-Key", idempotency_key)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::new("network_error", e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::new("invalid_response", e.to_string()))?;

        if let Some(error) = body.get("error") {
            let code = error["code"]
                .as_str()
                .or_else(|| error["type"].as_str())
                .unwrap_or("gateway_error");
            let message = error["message"].as_str().unwrap_or("Payment request failed");
            return Err(GatewayError::new(code, message));
        }

        Ok(body)
    }
}

fn outcome_from_status(status: &str) -> PaymentOutcome {
    match status {
        "succeeded" | "paid" => PaymentOutcome::Succeeded,
        "processing" | "pending" | "requires_action" | "requires_confirmation" => {
            PaymentOutcome::Pending
        }
        _ => PaymentOutcome::Failed,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge_customer(
        &self,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
        reference: &str,
        metadata: &[(String, String)],
    ) -> Result<ChargeReceipt, GatewayError> {
        let mut params = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), "usd".to_string()),
            ("customer".to_string(), customer_id.to_string()),
            ("description".to_string(), description.to_string()),
            ("confirm".to_string(), "true".to_string()),
            ("off_session".to_string(), "true".to_string()),
            ("metadata[reference]".to_string(), reference.to_string()),
        ];
        for (key, value) in metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let body = self
            .post_form(
                "/payment_intents",
                &params,
                &format!("{}-charge", reference),
            )
            .await?;

        let provider_id = body["id"]
            .as_str()
            .ok_or_else(|| GatewayError::new("invalid_response", "Missing payment intent id"))?
            .to_string();
        let outcome = outcome_from_status(body["status"].as_str().unwrap_or(""));

        Ok(ChargeReceipt {
            provider_id,
            outcome,
        })
    }

    async fn pay_worker(
        &self,
        payout_account_id: &str,
        amount_cents: i64,
        description: &str,
        reference: &str,
    ) -> Result<PayoutReceipt, GatewayError> {
        let params = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), "usd".to_string()),
            ("destination".to_string(), payout_account_id.to_string()),
            ("transfer_group".to_string(), reference.to_string()),
            ("description".to_string(), description.to_string()),
        ];

        let body = self
            .post_form("/transfers", &params, &format!("{}-payout", reference))
            .await?;

        let provider_id = body["id"]
            .as_str()
            .ok_or_else(|| GatewayError::new("invalid_response", "Missing transfer id"))?
            .to_string();

        // Transfers settle synchronously from the API's perspective; a created
        // transfer with an id has been accepted.
        Ok(PayoutReceipt {
            provider_id,
            outcome: PaymentOutcome::Succeeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(outcome_from_status("succeeded"), PaymentOutcome::Succeeded);
        assert_eq!(outcome_from_status("processing"), PaymentOutcome::Pending);
        assert_eq!(
            outcome_from_status("requires_action"),
            PaymentOutcome::Pending
        );
        assert_eq!(outcome_from_status("canceled"), PaymentOutcome::Failed);
        assert_eq!(outcome_from_status(""), PaymentOutcome::Failed);
    }

    #[test]
    fn test_gateway_error_display_keeps_provider_detail() {
        let err = GatewayError::new("card_declined", "Your card was declined.");
        assert_eq!(err.to_string(), "[card_declined] Your card was declined.");
    }
}
