//! In-memory gateway for testing.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{PaymentStatus, Provider};

use crate::{GatewayAmount, GatewayResponse, InitiateRequest, PaymentGateway};

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    fail_on_initiate: bool,
    fail_on_refund: bool,
    fail_on_cancel: bool,
    initiated: u32,
    refunds: Vec<(String, i64)>,
    cancelled: Vec<String>,
}

/// In-memory gateway for testing.
///
/// Registers under any provider name and can be told to fail specific
/// operations. Event names are canonical status strings, so tests drive
/// webhooks without provider-specific vocabularies.
#[derive(Clone)]
pub struct MockGateway {
    provider: Provider,
    state: Arc<RwLock<MockState>>,
}

impl MockGateway {
    /// Creates a mock gateway answering for the given provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    /// Configures the gateway to fail initiation calls.
    pub fn set_fail_on_initiate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initiate = fail;
    }

    /// Configures the gateway to fail refund calls.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_on_refund = fail;
    }

    /// Configures the gateway to fail cancellation calls.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Number of successful initiations.
    pub fn initiated_count(&self) -> u32 {
        self.state.read().unwrap().initiated
    }

    /// Refunds issued, as (gateway payment id, minor units) pairs.
    pub fn refunds(&self) -> Vec<(String, i64)> {
        self.state.read().unwrap().refunds.clone()
    }

    /// Gateway payment ids that were cancelled.
    pub fn cancelled(&self) -> Vec<String> {
        self.state.read().unwrap().cancelled.clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(Provider::Stripe)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn initiate(&self, _request: &InitiateRequest) -> GatewayResponse {
        let mut state = self.state.write().unwrap();

        if state.fail_on_initiate {
            return GatewayResponse::failure("Gateway unavailable");
        }

        state.next_id += 1;
        state.initiated += 1;
        let id = format!("gw_{:04}", state.next_id);
        GatewayResponse::ok(id.clone(), PaymentStatus::Pending)
            .with_redirect(format!("https://gateway.test/pay/{id}"))
    }

    fn map_event(&self, event: &str) -> PaymentStatus {
        PaymentStatus::parse(event).unwrap_or(PaymentStatus::Processing)
    }

    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: GatewayAmount,
        _reason: &str,
    ) -> GatewayResponse {
        let mut state = self.state.write().unwrap();

        if state.fail_on_refund {
            return GatewayResponse::failure("Refund rejected");
        }

        state
            .refunds
            .push((gateway_payment_id.to_string(), amount.minor_units));
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Refunded)
    }

    async fn cancel(&self, gateway_payment_id: &str) -> GatewayResponse {
        let mut state = self.state.write().unwrap();

        if state.fail_on_cancel {
            return GatewayResponse::failure("Cancellation rejected");
        }

        state.cancelled.push(gateway_payment_id.to_string());
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Cancelled)
    }

    async fn details(&self, gateway_payment_id: &str) -> GatewayResponse {
        GatewayResponse::ok(gateway_payment_id, PaymentStatus::Processing)
    }
}
