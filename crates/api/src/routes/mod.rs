//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use axum::Json;
use chrono::{DateTime, Utc};
use engine::{Inventory, OrderEngine, PaymentEngine, Users};
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{OrderStore, PageQuery, PaymentStore};

/// Shared application state accessible from all handlers.
///
/// The payment engine holds the order engine behind its [`engine::Orders`]
/// contract so payment-driven order transitions go through the same
/// guards as API-driven ones.
pub struct AppState<S, P, I, U>
where
    S: OrderStore,
    P: PaymentStore,
    I: Inventory,
    U: Users,
{
    pub orders: Arc<OrderEngine<S, P, I, U>>,
    pub payments: PaymentEngine<P, Arc<OrderEngine<S, P, I, U>>, U>,
}

/// Pagination and filter query parameters for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ListParams {
    /// Converts query parameters into the store's page query, applying
    /// defaults for anything omitted.
    pub fn to_query(&self) -> PageQuery {
        let mut query = PageQuery::new();
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(sort) = &self.sort {
            query = query.sort(sort.clone());
        }
        if let Some(status) = &self.status {
            query = query.status(status.clone());
        }
        if let Some(from) = self.start_date {
            query = query.from_date(from);
        }
        if let Some(to) = self.end_date {
            query = query.to_date(to);
        }
        query
    }
}

/// Success envelope: `{"success": true, "message": ..., "data": ...}`.
pub fn ok(message: &str, data: impl Serialize) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}
