//! Engine error taxonomy.

use common::{ItemId, OrderId, PaymentId};
use domain::{OrderError, PaymentError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// The taxonomy distinguishes business rejections (validation, state
/// conflicts) from retryable infrastructure failures (dependency, store)
/// so callers can map them to different responses.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing input, rejected before any persistence.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Product inactive or without enough stock for the requested
    /// quantity.
    #[error("Product not available: {0}")]
    ProductUnavailable(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Order item not found.
    #[error("Order item not found: {0}")]
    ItemNotFound(ItemId),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Acting on another user's order or payment.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A collaborator is unavailable or returned an error.
    #[error("Service unavailable: {0}")]
    Dependency(String),

    /// The payment provider rejected the operation.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Operation invalid for the order's current status.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Operation invalid for the payment's current status.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Backing store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
