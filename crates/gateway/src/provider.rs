//! The capability contract every payment provider implements.

use async_trait::async_trait;
use domain::{PaymentStatus, Provider};

use crate::{GatewayAmount, GatewayResponse, InitiateRequest};

/// A payment provider integration.
///
/// Implementations own their event-name translation table and normalize
/// every provider failure into a [`GatewayResponse`] with
/// `success: false` instead of returning an error.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which provider this gateway talks to.
    fn provider(&self) -> Provider;

    /// Starts a payment and returns the provider's correlation id plus
    /// redirect/client data.
    async fn initiate(&self, request: &InitiateRequest) -> GatewayResponse;

    /// Translates a provider event name into a canonical status.
    ///
    /// Pure function; unknown events map to `Processing` so an
    /// unrecognized webhook never corrupts a payment.
    fn map_event(&self, event: &str) -> PaymentStatus;

    /// Issues a refund against a completed payment.
    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: GatewayAmount,
        reason: &str,
    ) -> GatewayResponse;

    /// Cancels a payment that has not completed.
    async fn cancel(&self, gateway_payment_id: &str) -> GatewayResponse;

    /// Fetches the provider's view of a payment.
    async fn details(&self, gateway_payment_id: &str) -> GatewayResponse;
}
