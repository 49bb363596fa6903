//! Order persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::Order;
use tokio::sync::RwLock;

use crate::{Page, PageQuery, Result, SortField, StoreError};

/// Storage contract for order documents.
///
/// Each order is written as a whole document: line items and the status
/// log travel with it, so a single update is atomic for the record.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Replaces an existing order document.
    async fn update(&self, order: &Order) -> Result<()>;

    /// Fetches an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching the query, paginated.
    async fn list(&self, query: &PageQuery) -> Result<Page<Order>>;

    /// Lists one user's orders matching the query, paginated.
    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Order>>;
}

/// In-memory order store for testing.
///
/// Provides the same interface and filtering behavior as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }

    fn matches(order: &Order, query: &PageQuery) -> bool {
        if let Some(status) = &query.status
            && order.status.as_str() != status
        {
            return false;
        }
        if let Some(from) = query.from_date
            && order.created_at < from
        {
            return false;
        }
        if let Some(to) = query.to_date
            && order.created_at > to
        {
            return false;
        }
        true
    }

    fn page_of(mut matched: Vec<Order>, query: &PageQuery) -> Page<Order> {
        let key = query.sort_key();
        matched.sort_by_key(|o| match key.field {
            SortField::CreatedAt => o.created_at,
            SortField::UpdatedAt => o.updated_at,
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
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(StoreError::OrderNotFound(order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &PageQuery) -> Result<Page<Order>> {
        let orders = self.orders.read().await;
        let matched: Vec<Order> = orders
            .values()
            .filter(|o| Self::matches(o, query))
            .cloned()
            .collect();
        Ok(Self::page_of(matched, query))
    }

    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Order>> {
        let orders = self.orders.read().await;
        let matched: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id && Self::matches(o, query))
            .cloned()
            .collect();
        Ok(Self::page_of(matched, query))
    }
}
