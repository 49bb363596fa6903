//! Payment status machine.

use serde::{Deserialize, Serialize};

/// The status of a payment attempt.
///
/// Transitions:
/// ```text
/// Pending ──► Processing ──► Completed ──► Refunded
///    │            │              │
///    │            │              └──► PartiallyRefunded ──► Refunded
///    └────────────┴──► Failed | Cancelled
/// ```
///
/// Nothing leaves Completed except via refund; Failed, Cancelled and
/// Refunded are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment row created, gateway not yet confirmed.
    #[default]
    Pending,

    /// Gateway has acknowledged and is processing the payment.
    Processing,

    /// Funds captured.
    Completed,

    /// Gateway rejected or the payment attempt failed.
    Failed,

    /// Aborted before completion.
    Cancelled,

    /// Fully refunded (terminal).
    Refunded,

    /// Partially refunded; further refunds may follow.
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Returns true if the machine permits moving to `next`.
    ///
    /// Re-applying the current status is allowed so replayed webhooks
    /// stay harmless.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (*self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Processing, Completed)
                | (Pending, Failed)
                | (Processing, Failed)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
                | (Completed, Refunded)
                | (Completed, PartiallyRefunded)
                | (PartiallyRefunded, Refunded)
        )
    }

    /// Returns true if the payment can still be aborted.
    pub fn can_abort(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    /// Returns true if a refund can be issued against this payment.
    pub fn can_refund(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed | PaymentStatus::Cancelled | PaymentStatus::Refunded
        )
    }

    /// Returns the status name as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    /// Parses a lowercase status name.
    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "refunded" => Some(PaymentStatus::Refunded),
            "partially_refunded" => Some(PaymentStatus::PartiallyRefunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Processing));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Completed));
        // gateways that skip the processing event
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
    }

    #[test]
    fn failure_and_abort_edges() {
        for from in [PaymentStatus::Pending, PaymentStatus::Processing] {
            assert!(from.can_transition_to(PaymentStatus::Failed));
            assert!(from.can_transition_to(PaymentStatus::Cancelled));
            assert!(from.can_abort());
        }
        assert!(!PaymentStatus::Completed.can_abort());
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Failed));
    }

    #[test]
    fn refund_edges() {
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Refunded));
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::PartiallyRefunded));
        assert!(PaymentStatus::PartiallyRefunded.can_transition_to(PaymentStatus::Refunded));
        assert!(PaymentStatus::Completed.can_refund());
        assert!(PaymentStatus::PartiallyRefunded.can_refund());
        assert!(!PaymentStatus::Pending.can_refund());
        assert!(!PaymentStatus::Refunded.can_refund());
    }

    #[test]
    fn terminal_states_stay_put() {
        for terminal in [
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                PaymentStatus::Pending,
                PaymentStatus::Processing,
                PaymentStatus::Completed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn same_status_is_allowed() {
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Refunded.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn parse_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
            PaymentStatus::PartiallyRefunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("unknown"), None);
    }

    #[test]
    fn serialization_uses_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::PartiallyRefunded).unwrap();
        assert_eq!(json, "\"partially_refunded\"");
    }
}
