//! Uniform gateway result and request payloads.

use common::{Money, OrderId, PaymentId, UserId};
use domain::{PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// An amount expressed in the smallest currency unit, as every supported
/// provider expects it on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAmount {
    pub minor_units: i64,
    pub currency: String,
}

impl GatewayAmount {
    /// Converts a money amount for the given currency. USD, EUR, GBP and
    /// INR all carry two decimal places, so minor units line up with the
    /// internal representation.
    pub fn new(amount: Money, currency: impl Into<String>) -> Self {
        Self {
            minor_units: amount.cents(),
            currency: currency.into(),
        }
    }
}

/// Everything a provider needs to start a payment.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: GatewayAmount,
    pub method: PaymentMethod,
    pub return_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Uniform result of every gateway operation.
///
/// Provider failures are normalized into `success: false` with the
/// message set; they never propagate as errors. This is what keeps the
/// payment engine provider-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    pub gateway_payment_id: Option<String>,
    pub status: PaymentStatus,
    pub redirect_url: Option<String>,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl GatewayResponse {
    /// A successful response carrying the provider's correlation id.
    pub fn ok(gateway_payment_id: impl Into<String>, status: PaymentStatus) -> Self {
        Self {
            success: true,
            gateway_payment_id: Some(gateway_payment_id.into()),
            status,
            redirect_url: None,
            message: None,
            data: None,
        }
    }

    /// A normalized failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            gateway_payment_id: None,
            status: PaymentStatus::Failed,
            redirect_url: None,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
