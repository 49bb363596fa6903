//! Payment lifecycle engine.

use common::{Money, OrderId, PaymentId, UserId};
use domain::{
    Actor, OrderStatus, Payment, PaymentError, PaymentMethod, PaymentStatus, PaymentType, Provider,
};
use gateway::{GatewayAmount, GatewayRegistry, InitiateRequest};
use store::{Page, PageQuery, PaymentStore};

use crate::error::{EngineError, Result};
use crate::order_engine::Orders;
use crate::services::Users;

/// Input for initiating a payment.
#[derive(Debug, Clone)]
pub struct InitiatePaymentRequest {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub provider: Provider,
    /// Defaults to the order's final amount.
    pub amount: Option<Money>,
    /// Defaults to the order's currency.
    pub currency: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub return_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Result of a successful initiation: the payment row plus whatever the
/// provider needs the client to do next.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentInitiation {
    pub payment: Payment,
    pub redirect_url: Option<String>,
    pub client_data: Option<serde_json::Value>,
}

/// Outcome of webhook processing. Webhooks never fail hard: unknown or
/// duplicate deliveries report `processed: false` with an explanation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WebhookOutcome {
    pub processed: bool,
    pub message: String,
    pub payment_id: Option<PaymentId>,
    pub status: Option<PaymentStatus>,
}

impl WebhookOutcome {
    fn skipped(message: impl Into<String>) -> Self {
        Self {
            processed: false,
            message: message.into(),
            payment_id: None,
            status: None,
        }
    }
}

/// Drives payments through their lifecycle: initiation against a
/// gateway, webhook reconciliation, refunds, and aborts. Order status
/// pushes go through the [`Orders`] contract, never the order store.
pub struct PaymentEngine<P, O, U>
where
    P: PaymentStore,
    O: Orders,
    U: Users,
{
    payments: P,
    orders: O,
    users: U,
    registry: GatewayRegistry,
}

impl<P, O, U> PaymentEngine<P, O, U>
where
    P: PaymentStore,
    O: Orders,
    U: Users,
{
    /// Creates a new payment engine.
    pub fn new(payments: P, orders: O, users: U, registry: GatewayRegistry) -> Self {
        Self {
            payments,
            orders,
            users,
            registry,
        }
    }

    fn gateway(&self, provider: Provider) -> Result<std::sync::Arc<dyn gateway::PaymentGateway>> {
        self.registry
            .get(provider)
            .ok_or_else(|| EngineError::Gateway(format!("Gateway not configured: {provider}")))
    }

    /// Starts a payment for an order.
    ///
    /// The payment row is persisted PENDING before the gateway is
    /// called, so a record exists even if initiation fails; a gateway
    /// failure marks it FAILED with the reason in metadata.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn initiate_payment(
        &self,
        request: InitiatePaymentRequest,
    ) -> Result<PaymentInitiation> {
        let order = self.orders.get_order(request.order_id).await?;
        if order.user_id != request.user_id {
            return Err(EngineError::Unauthorized(
                "Order belongs to a different user".to_string(),
            ));
        }

        let amount = request.amount.unwrap_or(order.final_amount);
        if !amount.is_positive() {
            return Err(EngineError::Validation(format!(
                "Invalid payment amount: {amount}"
            )));
        }
        let currency = request
            .currency
            .unwrap_or_else(|| order.currency.clone());

        let mut payment = Payment::new(
            request.user_id,
            request.order_id,
            amount,
            currency.clone(),
            request.method,
            request.payment_type.unwrap_or_default(),
            request.provider,
        );
        if let Some(metadata) = &request.metadata {
            payment.set_metadata("client", metadata.clone());
        }
        self.payments.insert(&payment).await?;

        let gateway = self.gateway(request.provider)?;
        let response = gateway
            .initiate(&InitiateRequest {
                payment_id: payment.id,
                order_id: payment.order_id,
                user_id: payment.user_id,
                amount: GatewayAmount::new(amount, currency),
                method: request.method,
                return_url: request.return_url,
                metadata: request.metadata,
            })
            .await;

        if !response.success {
            let reason = response
                .message
                .unwrap_or_else(|| "Gateway initiation failed".to_string());
            payment.set_metadata("failure_reason", serde_json::json!(reason));
            payment.set_status(PaymentStatus::Failed)?;
            self.payments.update(&payment).await?;
            return Err(EngineError::Gateway(reason));
        }

        payment.gateway_payment_id = response.gateway_payment_id.clone();
        payment.set_status(response.status)?;
        self.payments.update(&payment).await?;

        metrics::counter!("payments_initiated_total", "provider" => request.provider.as_str())
            .increment(1);
        Ok(PaymentInitiation {
            payment,
            redirect_url: response.redirect_url,
            client_data: response.data,
        })
    }

    /// Applies a provider webhook.
    ///
    /// Lookup is keyed on the gateway's correlation id, so delivery
    /// order does not matter and replays are safe: an unknown id or an
    /// unchanged status is reported, not failed, and the raw payload is
    /// persisted either way. Side-effect fan-out is keyed strictly on
    /// the new canonical status and is best-effort.
    #[tracing::instrument(skip(self, data))]
    pub async fn process_webhook(
        &self,
        provider: Provider,
        event: &str,
        gateway_payment_id: &str,
        data: serde_json::Value,
    ) -> Result<WebhookOutcome> {
        metrics::counter!("payment_webhooks_total", "provider" => provider.as_str()).increment(1);

        let gateway = match self.registry.get(provider) {
            Some(gateway) => gateway,
            None => {
                return Ok(WebhookOutcome::skipped(format!(
                    "Gateway not configured: {provider}"
                )));
            }
        };

        let Some(mut payment) = self.payments.get_by_gateway_id(gateway_payment_id).await? else {
            return Ok(WebhookOutcome::skipped(
                "Payment not found, possibly duplicate webhook",
            ));
        };

        let new_status = gateway.map_event(event);
        payment.set_gateway_response(serde_json::json!({ "event": event, "data": data }));

        if new_status == payment.status {
            self.payments.update(&payment).await?;
            return Ok(WebhookOutcome {
                processed: true,
                message: "Status unchanged, side effects skipped".to_string(),
                payment_id: Some(payment.id),
                status: Some(payment.status),
            });
        }

        if let Err(e) = payment.set_status(new_status) {
            self.payments.update(&payment).await?;
            return Ok(WebhookOutcome {
                processed: false,
                message: e.to_string(),
                payment_id: Some(payment.id),
                status: Some(payment.status),
            });
        }
        self.payments.update(&payment).await?;

        match new_status {
            PaymentStatus::Completed => {
                self.push_order_status(
                    &payment,
                    OrderStatus::Processing,
                    "Payment completed",
                )
                .await;
                self.notify(&payment, "Payment received", "Your payment was successful")
                    .await;
            }
            PaymentStatus::Failed => {
                self.push_order_status(&payment, OrderStatus::Pending, "Payment failed")
                    .await;
                self.notify(&payment, "Payment failed", "Your payment could not be processed")
                    .await;
            }
            PaymentStatus::Refunded => {
                self.push_order_status(&payment, OrderStatus::Refunded, "Payment refunded")
                    .await;
                self.notify(&payment, "Payment refunded", "Your payment has been refunded")
                    .await;
            }
            _ => {}
        }

        Ok(WebhookOutcome {
            processed: true,
            message: format!("Payment updated to {new_status}"),
            payment_id: Some(payment.id),
            status: Some(new_status),
        })
    }

    /// Refunds a completed payment, fully by default.
    ///
    /// A full refund also advances the order to REFUNDED (best-effort;
    /// the order must already be cancelled for that edge to apply).
    #[tracing::instrument(skip(self, reason))]
    pub async fn refund_payment(
        &self,
        payment_id: PaymentId,
        amount: Option<Money>,
        reason: Option<String>,
    ) -> Result<Payment> {
        let mut payment = self.get_payment(payment_id).await?;
        if !payment.status.can_refund() {
            return Err(PaymentError::CannotRefund {
                status: payment.status,
            }
            .into());
        }

        let remaining = payment.remaining_refundable();
        let amount = amount.unwrap_or(remaining);
        if !amount.is_positive() {
            return Err(PaymentError::InvalidRefundAmount { amount }.into());
        }
        if amount > remaining {
            return Err(PaymentError::RefundExceedsPayment {
                requested: amount,
                remaining,
            }
            .into());
        }

        let reason = reason.unwrap_or_else(|| "Refund requested".to_string());
        let gateway = self.gateway(payment.provider)?;
        let gateway_id = payment.gateway_payment_id.clone().unwrap_or_default();
        let response = gateway
            .refund(
                &gateway_id,
                GatewayAmount::new(amount, payment.currency.clone()),
                &reason,
            )
            .await;

        if !response.success {
            return Err(EngineError::Gateway(
                response
                    .message
                    .unwrap_or_else(|| "Gateway refund failed".to_string()),
            ));
        }

        let refund_id = response
            .data
            .as_ref()
            .and_then(|d| d.get("refund_id"))
            .and_then(|v| v.as_str())
            .map(String::from);
        let full = payment.record_refund(Some(amount), reason.clone(), refund_id)?;
        self.payments.update(&payment).await?;
        metrics::counter!("payment_refunds_total").increment(1);

        if full {
            self.push_order_status(&payment, OrderStatus::Refunded, "Payment refunded")
                .await;
        }
        self.notify(&payment, "Payment refunded", &reason).await;
        Ok(payment)
    }

    /// Aborts a payment that has not completed and reverts the order to
    /// PENDING so the user can retry.
    #[tracing::instrument(skip(self))]
    pub async fn abort_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        let mut payment = self.get_payment(payment_id).await?;
        if !payment.status.can_abort() {
            return Err(PaymentError::CannotAbort {
                status: payment.status,
            }
            .into());
        }

        let gateway = self.gateway(payment.provider)?;
        let gateway_id = payment.gateway_payment_id.clone().unwrap_or_default();
        if !gateway_id.is_empty() {
            let response = gateway.cancel(&gateway_id).await;
            if !response.success {
                return Err(EngineError::Gateway(
                    response
                        .message
                        .unwrap_or_else(|| "Gateway cancellation failed".to_string()),
                ));
            }
        }

        payment.set_status(PaymentStatus::Cancelled)?;
        self.payments.update(&payment).await?;

        self.push_order_status(&payment, OrderStatus::Pending, "Payment aborted")
            .await;
        Ok(payment)
    }

    /// Fetches a payment by id.
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or(EngineError::PaymentNotFound(payment_id))
    }

    /// Lists an order's payments.
    pub async fn list_payments_by_order(
        &self,
        order_id: OrderId,
        query: &PageQuery,
    ) -> Result<Page<Payment>> {
        Ok(self.payments.list_by_order(order_id, query).await?)
    }

    /// Lists a user's payments.
    pub async fn list_payments_by_user(
        &self,
        user_id: UserId,
        query: &PageQuery,
    ) -> Result<Page<Payment>> {
        Ok(self.payments.list_by_user(user_id, query).await?)
    }

    /// Pushes an order status change through the order engine contract.
    /// Failures are logged, never propagated.
    async fn push_order_status(&self, payment: &Payment, next: OrderStatus, comment: &str) {
        if let Err(e) = self
            .orders
            .update_order_status(
                payment.order_id,
                next,
                Some(comment.to_string()),
                Actor::System,
            )
            .await
        {
            tracing::warn!(
                payment_id = %payment.id,
                order_id = %payment.order_id,
                status = %next,
                error = %e,
                "order status push failed"
            );
        }
    }

    async fn notify(&self, payment: &Payment, subject: &str, message: &str) {
        if !self.users.notify(payment.user_id, subject, message).await {
            tracing::warn!(payment_id = %payment.id, user_id = %payment.user_id, "notification failed");
        }
    }
}
