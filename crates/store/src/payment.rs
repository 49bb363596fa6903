//! Payment persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId, UserId};
use domain::Payment;
use tokio::sync::RwLock;

use crate::{Page, PageQuery, Result, SortField, StoreError};

/// Storage contract for payment documents.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new payment.
    async fn insert(&self, payment: &Payment) -> Result<()>;

    /// Replaces an existing payment document.
    async fn update(&self, payment: &Payment) -> Result<()>;

    /// Fetches a payment by id.
    async fn get(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// Fetches a payment by the gateway-assigned correlation id.
    ///
    /// This is the webhook lookup path: providers identify payments by
    /// their own id, never by ours.
    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>>;

    /// Lists an order's payments matching the query, paginated.
    async fn list_by_order(&self, order_id: OrderId, query: &PageQuery) -> Result<Page<Payment>>;

    /// Lists a user's payments matching the query, paginated.
    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Payment>>;
}

/// In-memory payment store for testing.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of payments stored.
    pub async fn count(&self) -> usize {
        self.payments.read().await.len()
    }

    fn matches(payment: &Payment, query: &PageQuery) -> bool {
        if let Some(status) = &query.status
            && payment.status.as_str() != status
        {
            return false;
        }
        if let Some(from) = query.from_date
            && payment.created_at < from
        {
            return false;
        }
        if let Some(to) = query.to_date
            && payment.created_at > to
        {
            return false;
        }
        true
    }

    fn page_of(mut matched: Vec<Payment>, query: &PageQuery) -> Page<Payment> {
        let key = query.sort_key();
        matched.sort_by_key(|p| match key.field {
            SortField::CreatedAt => p.created_at,
            SortField::UpdatedAt => p.updated_at,
        });
        if key.descending {
            matched.reverse();
        }

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit.max(1) as usize)
            .collect();
        Page::new(items, total, query)
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<()> {
        self.payments
            .write()
            .await
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        if !payments.contains_key(&payment.id) {
            return Err(StoreError::PaymentNotFound(payment.id));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|p| p.gateway_payment_id.as_deref() == Some(gateway_payment_id))
            .cloned())
    }

    async fn list_by_order(&self, order_id: OrderId, query: &PageQuery) -> Result<Page<Payment>> {
        let payments = self.payments.read().await;
        let matched: Vec<Payment> = payments
            .values()
            .filter(|p| p.order_id == order_id && Self::matches(p, query))
            .cloned()
            .collect();
        Ok(Self::page_of(matched, query))
    }

    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Payment>> {
        let payments = self.payments.read().await;
        let matched: Vec<Payment> = payments
            .values()
            .filter(|p| p.user_id == user_id && Self::matches(p, query))
            .cloned()
            .collect();
        Ok(Self::page_of(matched, query))
    }
}
