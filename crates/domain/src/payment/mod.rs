//! Payment record, refund history, and the payment status machine.

mod model;
mod status;

pub use model::{Payment, PaymentMethod, PaymentType, Provider, RefundDetail};
pub use status::PaymentStatus;

use common::Money;
use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The requested status change is not an edge in the payment graph.
    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Refunds only apply to completed (or partially refunded) payments.
    #[error("Cannot refund payment in {status} status")]
    CannotRefund { status: PaymentStatus },

    /// Aborting only applies to pending/processing payments.
    #[error("Cannot abort payment in {status} status")]
    CannotAbort { status: PaymentStatus },

    /// Refund amounts must be positive.
    #[error("Invalid refund amount: {amount}")]
    InvalidRefundAmount { amount: Money },

    /// The cumulative refund cannot exceed the original amount.
    #[error("Refund of {requested} exceeds remaining refundable amount {remaining}")]
    RefundExceedsPayment { requested: Money, remaining: Money },
}
