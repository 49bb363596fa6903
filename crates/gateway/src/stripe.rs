//! Stripe gateway.

use async_trait::async_trait;
use domain::{PaymentStatus, Provider};
use uuid::Uuid;

use crate::{GatewayAmount, GatewayResponse, InitiateRequest, PaymentGateway};

/// Stripe API credentials.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: Option<String>,
}

/// Stripe integration.
///
/// Correlation ids and checkout URLs follow Stripe's payment-intent
/// shapes; the webhook translation table covers the payment-intent and
/// charge events this engine reacts to.
pub struct StripeGateway {
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self { config }
    }

    fn credentials_ok(&self) -> bool {
        !self.config.secret_key.is_empty()
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> Provider {
        Provider::Stripe
    }

    async fn initiate(&self, request: &InitiateRequest) -> GatewayResponse {
        if !self.credentials_ok() {
            return GatewayResponse::failure("Stripe credentials not configured");
        }

        let intent_id = format!("pi_{}", Uuid::new_v4().simple());
        let client_secret = format!("{intent_id}_secret_{}", Uuid::new_v4().simple());

        tracing::debug!(payment_id = %request.payment_id, %intent_id, "stripe payment initiated");

        GatewayResponse::ok(intent_id.clone(), PaymentStatus::Pending)
            .with_redirect(format!("https://checkout.stripe.com/c/pay/{intent_id}"))
            .with_data(serde_json::json!({
                "client_secret": client_secret,
                "amount": request.amount.minor_units,
                "currency": request.amount.currency.to_lowercase(),
            }))
    }

    fn map_event(&self, event: &str) -> PaymentStatus {
        match event {
            "payment_intent.created" => PaymentStatus::Pending,
            "payment_intent.processing" => PaymentStatus::Processing,
            "payment_intent.succeeded" => PaymentStatus::Completed,
            "payment_intent.payment_failed" => PaymentStatus::Failed,
            "payment_intent.canceled" => PaymentStatus::Cancelled,
            "charge.refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Processing,
        }
    }

    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: GatewayAmount,
        reason: &str,
    ) -> GatewayResponse {
        if !self.credentials_ok() {
            return GatewayResponse::failure("Stripe credentials not configured");
        }
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Stripe payment intent id");
        }

        let refund_id = format!("re_{}", Uuid::new_v4().simple());
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Refunded).with_data(
            serde_json::json!({
                "refund_id": refund_id,
                "amount": amount.minor_units,
                "currency": amount.currency.to_lowercase(),
                "reason": reason,
            }),
        )
    }

    async fn cancel(&self, gateway_payment_id: &str) -> GatewayResponse {
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Stripe payment intent id");
        }
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Cancelled)
    }

    async fn details(&self, gateway_payment_id: &str) -> GatewayResponse {
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Stripe payment intent id");
        }
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, OrderId, PaymentId, UserId};
    use domain::PaymentMethod;

    fn gateway() -> StripeGateway {
        StripeGateway::new(StripeConfig {
            secret_key: "sk_test_123".to_string(),
            webhook_secret: None,
        })
    }

    fn request() -> InitiateRequest {
        InitiateRequest {
            payment_id: PaymentId::new(),
            order_id: OrderId::new(),
            user_id: UserId::new(),
            amount: GatewayAmount::new(Money::from_cents(14440), "USD"),
            method: PaymentMethod::CreditCard,
            return_url: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn initiate_returns_intent_and_redirect() {
        let response = gateway().initiate(&request()).await;

        assert!(response.success);
        assert_eq!(response.status, PaymentStatus::Pending);
        let id = response.gateway_payment_id.unwrap();
        assert!(id.starts_with("pi_"));
        assert!(response.redirect_url.unwrap().contains(&id));
        assert_eq!(response.data.unwrap()["amount"], 14440);
    }

    #[tokio::test]
    async fn missing_credentials_normalize_to_failure() {
        let gateway = StripeGateway::new(StripeConfig {
            secret_key: String::new(),
            webhook_secret: None,
        });
        let response = gateway.initiate(&request()).await;
        assert!(!response.success);
        assert_eq!(response.status, PaymentStatus::Failed);
    }

    #[test]
    fn event_map_covers_lifecycle() {
        let gateway = gateway();
        assert_eq!(
            gateway.map_event("payment_intent.created"),
            PaymentStatus::Pending
        );
        assert_eq!(
            gateway.map_event("payment_intent.processing"),
            PaymentStatus::Processing
        );
        assert_eq!(
            gateway.map_event("payment_intent.succeeded"),
            PaymentStatus::Completed
        );
        assert_eq!(
            gateway.map_event("payment_intent.payment_failed"),
            PaymentStatus::Failed
        );
        assert_eq!(
            gateway.map_event("payment_intent.canceled"),
            PaymentStatus::Cancelled
        );
        assert_eq!(
            gateway.map_event("charge.refunded"),
            PaymentStatus::Refunded
        );
    }

    #[test]
    fn unknown_events_map_to_processing() {
        assert_eq!(
            gateway().map_event("customer.subscription.updated"),
            PaymentStatus::Processing
        );
    }

    #[tokio::test]
    async fn refund_requires_intent_id() {
        let amount = GatewayAmount::new(Money::from_cents(1000), "USD");
        let response = gateway().refund("", amount, "test").await;
        assert!(!response.success);
    }
}
