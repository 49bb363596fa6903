//! Payment record with refund history.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use super::{PaymentError, PaymentStatus};

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    NetBanking,
    Wallet,
    CashOnDelivery,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the payment covers the whole order, part of it, or one
/// installment of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Full,
    Partial,
    Installment,
}

/// The payment provider handling this payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Stripe,
    Razorpay,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Stripe => "stripe",
            Provider::Razorpay => "razorpay",
        }
    }

    /// Parses a lowercase provider name.
    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "stripe" => Some(Provider::Stripe),
            "razorpay" => Some(Provider::Razorpay),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One refund issued against a payment. Entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundDetail {
    pub amount: Money,
    pub reason: String,
    pub gateway_refund_id: Option<String>,
    pub refunded_at: DateTime<Utc>,
}

/// A payment attempt against an order.
///
/// Created PENDING before the gateway is ever called, so a record exists
/// even when initiation fails. Never deleted, only terminally statused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub method: PaymentMethod,
    pub payment_type: PaymentType,
    pub provider: Provider,
    pub status: PaymentStatus,
    /// Correlation id assigned by the gateway at initiation.
    pub gateway_payment_id: Option<String>,
    /// Last raw provider payload, kept for auditing. Never read back by
    /// the engines.
    #[serde(default)]
    pub gateway_response: Option<serde_json::Value>,
    pub refund_details: Vec<RefundDetail>,
    /// Opaque gateway payloads and failure reasons, keyed by source.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment record.
    pub fn new(
        user_id: UserId,
        order_id: OrderId,
        amount: Money,
        currency: impl Into<String>,
        method: PaymentMethod,
        payment_type: PaymentType,
        provider: Provider,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            user_id,
            order_id,
            amount,
            currency: currency.into(),
            method,
            payment_type,
            provider,
            status: PaymentStatus::Pending,
            gateway_payment_id: None,
            gateway_response: None,
            refund_details: Vec::new(),
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the payment to `next` if the machine allows it.
    pub fn set_status(&mut self, next: PaymentStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the stored raw provider payload.
    pub fn set_gateway_response(&mut self, payload: serde_json::Value) {
        self.gateway_response = Some(payload);
        self.updated_at = Utc::now();
    }

    /// Merges a key into the metadata object, creating it if absent.
    pub fn set_metadata(&mut self, key: &str, value: serde_json::Value) {
        if !self.metadata.is_object() {
            self.metadata = serde_json::json!({});
        }
        if let Some(map) = self.metadata.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        self.updated_at = Utc::now();
    }

    /// Total refunded so far across all refund entries.
    pub fn refunded_total(&self) -> Money {
        self.refund_details.iter().map(|r| r.amount).sum()
    }

    /// Amount still available for refund.
    pub fn remaining_refundable(&self) -> Money {
        self.amount - self.refunded_total()
    }

    /// Records a refund and moves the status to Refunded or
    /// PartiallyRefunded depending on the cumulative total.
    ///
    /// `amount == None` refunds everything still outstanding. Returns
    /// true when the payment is now fully refunded.
    pub fn record_refund(
        &mut self,
        amount: Option<Money>,
        reason: impl Into<String>,
        gateway_refund_id: Option<String>,
    ) -> Result<bool, PaymentError> {
        if !self.status.can_refund() {
            return Err(PaymentError::CannotRefund {
                status: self.status,
            });
        }

        let remaining = self.remaining_refundable();
        let amount = amount.unwrap_or(remaining);
        if !amount.is_positive() {
            return Err(PaymentError::InvalidRefundAmount { amount });
        }
        if amount > remaining {
            return Err(PaymentError::RefundExceedsPayment {
                requested: amount,
                remaining,
            });
        }

        self.refund_details.push(RefundDetail {
            amount,
            reason: reason.into(),
            gateway_refund_id,
            refunded_at: Utc::now(),
        });

        let full = self.refunded_total() == self.amount;
        let next = if full {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        self.set_status(next)?;
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_payment(cents: i64) -> Payment {
        let mut payment = Payment::new(
            UserId::new(),
            OrderId::new(),
            Money::from_cents(cents),
            "USD",
            PaymentMethod::CreditCard,
            PaymentType::Full,
            Provider::Stripe,
        );
        payment.set_status(PaymentStatus::Processing).unwrap();
        payment.set_status(PaymentStatus::Completed).unwrap();
        payment
    }

    #[test]
    fn new_payment_is_pending() {
        let payment = Payment::new(
            UserId::new(),
            OrderId::new(),
            Money::from_cents(14440),
            "USD",
            PaymentMethod::Upi,
            PaymentType::Full,
            Provider::Razorpay,
        );
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.gateway_payment_id.is_none());
        assert!(payment.refund_details.is_empty());
    }

    #[test]
    fn full_refund_by_default() {
        let mut payment = completed_payment(10000);

        let full = payment.record_refund(None, "customer request", None).unwrap();

        assert!(full);
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refunded_total(), Money::from_cents(10000));
        assert_eq!(payment.refund_details.len(), 1);
    }

    #[test]
    fn partial_then_final_refund() {
        let mut payment = completed_payment(10000);

        let full = payment
            .record_refund(Some(Money::from_cents(4000)), "damaged item", None)
            .unwrap();
        assert!(!full);
        assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(payment.remaining_refundable(), Money::from_cents(6000));

        let full = payment.record_refund(None, "remainder", None).unwrap();
        assert!(full);
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refund_details.len(), 2);
    }

    #[test]
    fn refund_cannot_exceed_remaining() {
        let mut payment = completed_payment(10000);
        payment
            .record_refund(Some(Money::from_cents(7000)), "partial", None)
            .unwrap();

        let result = payment.record_refund(Some(Money::from_cents(5000)), "too much", None);
        assert!(matches!(
            result,
            Err(PaymentError::RefundExceedsPayment { .. })
        ));
        assert_eq!(payment.refund_details.len(), 1);
    }

    #[test]
    fn refund_rejects_non_positive_amounts() {
        let mut payment = completed_payment(10000);
        let result = payment.record_refund(Some(Money::zero()), "nothing", None);
        assert!(matches!(
            result,
            Err(PaymentError::InvalidRefundAmount { .. })
        ));
    }

    #[test]
    fn refund_requires_completed() {
        let mut payment = Payment::new(
            UserId::new(),
            OrderId::new(),
            Money::from_cents(5000),
            "USD",
            PaymentMethod::Wallet,
            PaymentType::Full,
            Provider::Stripe,
        );
        let result = payment.record_refund(None, "early", None);
        assert!(matches!(result, Err(PaymentError::CannotRefund { .. })));
    }

    #[test]
    fn no_further_refund_after_full() {
        let mut payment = completed_payment(5000);
        payment.record_refund(None, "all of it", None).unwrap();

        let result = payment.record_refund(Some(Money::from_cents(1)), "again", None);
        assert!(matches!(result, Err(PaymentError::CannotRefund { .. })));
    }

    #[test]
    fn invalid_transition_rejected() {
        let mut payment = completed_payment(5000);
        let result = payment.set_status(PaymentStatus::Pending);
        assert!(matches!(
            result,
            Err(PaymentError::InvalidTransition { .. })
        ));
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn metadata_merges_keys() {
        let mut payment = completed_payment(5000);
        payment.set_metadata("failure_reason", serde_json::json!("declined"));
        payment.set_metadata("webhook", serde_json::json!({"event": "x"}));

        assert_eq!(payment.metadata["failure_reason"], "declined");
        assert_eq!(payment.metadata["webhook"]["event"], "x");
    }

    #[test]
    fn gateway_response_replaces_previous_payload() {
        let mut payment = completed_payment(5000);
        payment.set_gateway_response(serde_json::json!({"event": "payment_intent.created"}));
        payment.set_gateway_response(serde_json::json!({"event": "payment_intent.succeeded"}));

        let payload = payment.gateway_response.as_ref().unwrap();
        assert_eq!(payload["event"], "payment_intent.succeeded");
        assert_eq!(payment.metadata, serde_json::Value::Null);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut payment = completed_payment(10000);
        payment
            .record_refund(Some(Money::from_cents(2500)), "partial", Some("re_1".into()))
            .unwrap();

        let json = serde_json::to_string(&payment).unwrap();
        let back: Payment = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, payment.id);
        assert_eq!(back.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(back.refund_details.len(), 1);
        assert_eq!(back.refund_details[0].gateway_refund_id.as_deref(), Some("re_1"));
    }
}
