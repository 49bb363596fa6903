//! Razorpay gateway.

use async_trait::async_trait;
use domain::{PaymentStatus, Provider};
use uuid::Uuid;

use crate::{GatewayAmount, GatewayResponse, InitiateRequest, PaymentGateway};

/// Razorpay API credentials.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
}

/// Razorpay integration.
///
/// Razorpay's flow starts from an order object; payments and refunds
/// reference it. The translation table covers the order/payment/refund
/// webhook events.
pub struct RazorpayGateway {
    config: RazorpayConfig,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self { config }
    }

    fn credentials_ok(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.is_empty()
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn provider(&self) -> Provider {
        Provider::Razorpay
    }

    async fn initiate(&self, request: &InitiateRequest) -> GatewayResponse {
        if !self.credentials_ok() {
            return GatewayResponse::failure("Razorpay credentials not configured");
        }

        let order_ref = format!("order_{}", Uuid::new_v4().simple());

        tracing::debug!(payment_id = %request.payment_id, %order_ref, "razorpay order created");

        GatewayResponse::ok(order_ref.clone(), PaymentStatus::Pending)
            .with_redirect(format!("https://api.razorpay.com/v1/checkout/{order_ref}"))
            .with_data(serde_json::json!({
                "key_id": self.config.key_id,
                "amount": request.amount.minor_units,
                "currency": request.amount.currency,
            }))
    }

    fn map_event(&self, event: &str) -> PaymentStatus {
        match event {
            "order.created" => PaymentStatus::Pending,
            "payment.authorized" => PaymentStatus::Processing,
            "payment.captured" => PaymentStatus::Completed,
            "payment.failed" => PaymentStatus::Failed,
            "refund.processed" => PaymentStatus::Refunded,
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
            return GatewayResponse::failure("Razorpay credentials not configured");
        }
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Razorpay order reference");
        }

        let refund_id = format!("rfnd_{}", Uuid::new_v4().simple());
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Refunded).with_data(
            serde_json::json!({
                "refund_id": refund_id,
                "amount": amount.minor_units,
                "currency": amount.currency,
                "notes": { "reason": reason },
            }),
        )
    }

    async fn cancel(&self, gateway_payment_id: &str) -> GatewayResponse {
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Razorpay order reference");
        }
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Cancelled)
    }

    async fn details(&self, gateway_payment_id: &str) -> GatewayResponse {
        if gateway_payment_id.is_empty() {
            return GatewayResponse::failure("Missing Razorpay order reference");
        }
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Processing)
    }
}
