//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ItemId, OrderId, UserId};
use domain::{Actor, Discount, OrderStatus};
use engine::{CreateOrderRequest, Inventory, NewOrderItem, Users};
use serde::Deserialize;
use store::{OrderStore, PaymentStore};

use super::{AppState, ListParams, ok};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub user_id: UserId,
    /// Explicit lines; exactly one of `items` and `cart_id` must be set.
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
    pub cart_id: Option<String>,
    pub discount: Option<Discount>,
    pub gst_number: Option<String>,
    pub currency: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    pub comment: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Deserialize)]
pub struct DiscountBody {
    pub discount: Discount,
    pub user_id: Option<UserId>,
}

#[derive(Deserialize)]
pub struct UpdateItemBody {
    pub quantity: Option<u32>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<UserId>,
}

fn actor_from(user_id: Option<UserId>) -> Actor {
    match user_id {
        Some(id) => Actor::User(id),
        None => Actor::System,
    }
}

fn parse_status(s: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown order status: {s}")))
}

// -- Handlers --

/// POST /orders — create an order from product references or a cart.
#[tracing::instrument(skip(state, body), fields(user_id = %body.user_id))]
pub async fn create<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .create_order(CreateOrderRequest {
            user_id: body.user_id,
            items: body.items,
            cart_id: body.cart_id,
            discount: body.discount,
            gst_number: body.gst_number,
            currency: body.currency,
        })
        .await?;
    Ok((StatusCode::CREATED, ok("Order created", order)))
}

/// GET /orders — list orders with pagination and filters.
#[tracing::instrument(skip(state))]
pub async fn list<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let page = state.orders.list_orders(&params.to_query()).await?;
    Ok(ok("Orders retrieved", page))
}

/// GET /users/{user_id}/orders — list one user's orders.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(user_id): Path<UserId>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let page = state
        .orders
        .list_orders_by_user(user_id, &params.to_query())
        .await?;
    Ok(ok("Orders retrieved", page))
}

/// GET /orders/{id} — fetch one order.
#[tracing::instrument(skip(state))]
pub async fn get<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state.orders.get_order(id).await?;
    Ok(ok("Order retrieved", order))
}

/// GET /orders/{id}/detail — order plus its payments.
#[tracing::instrument(skip(state))]
pub async fn detail<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let detail = state.orders.get_order_detail(id).await?;
    Ok(ok("Order detail retrieved", detail))
}

/// GET /orders/{id}/shipping — order plus the owner's address.
#[tracing::instrument(skip(state))]
pub async fn shipping<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state.orders.get_order_with_shipping(id).await?;
    Ok(ok("Order retrieved", order))
}

/// PATCH /orders/{id}/status — move an order along its lifecycle.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let status = parse_status(&body.status)?;
    let order = state
        .orders
        .update_status(id, status, body.comment, actor_from(body.user_id))
        .await?;
    Ok(ok("Order status updated", order))
}

/// POST /orders/{id}/cancel — cancel the whole order.
#[tracing::instrument(skip(state, body))]
pub async fn cancel<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
    Json(body): Json<CancelBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .cancel_order(id, body.reason, actor_from(body.user_id))
        .await?;
    Ok(ok("Order cancelled", order))
}

/// POST /orders/{id}/discount — apply a discount to a pending order.
#[tracing::instrument(skip(state, body))]
pub async fn apply_discount<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
    Json(body): Json<DiscountBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .apply_discount(id, body.discount, actor_from(body.user_id))
        .await?;
    Ok(ok("Discount applied", order))
}

/// GET /orders/{id}/items — list an order's line items.
#[tracing::instrument(skip(state))]
pub async fn items<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let items = state.orders.get_order_items(id).await?;
    Ok(ok("Order items retrieved", items))
}

/// PATCH /orders/{id}/items/{item_id} — change quantity or status.
#[tracing::instrument(skip(state, body))]
pub async fn update_item<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path((id, item_id)): Path<(OrderId, ItemId)>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .update_order_item(id, item_id, body.quantity, body.status, actor_from(body.user_id))
        .await?;
    Ok(ok("Order item updated", order))
}

/// DELETE /orders/{id}/items/{item_id} — remove an item (soft delete).
#[tracing::instrument(skip(state))]
pub async fn delete_item<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path((id, item_id)): Path<(OrderId, ItemId)>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .delete_order_item(id, item_id, Actor::System)
        .await?;
    Ok(ok("Order item removed", order))
}

/// POST /orders/{id}/items/{item_id}/cancel — cancel one line item.
#[tracing::instrument(skip(state, body))]
pub async fn cancel_item<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path((id, item_id)): Path<(OrderId, ItemId)>,
    Json(body): Json<CancelBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let order = state
        .orders
        .cancel_order_item(id, item_id, body.reason, actor_from(body.user_id))
        .await?;
    Ok(ok("Order item cancelled", order))
}

/// GET /orders/{id}/status-log — the order's audit trail.
#[tracing::instrument(skip(state))]
pub async fn status_log<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let log = state.orders.get_status_log(id).await?;
    Ok(ok("Status log retrieved", log))
}

/// GET /orders/{id}/payments — payments attached to an order.
#[tracing::instrument(skip(state))]
pub async fn payments<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<OrderId>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    // 404 on unknown order rather than an empty page
    state.orders.get_order(id).await?;
    let page = state
        .payments
        .list_payments_by_order(id, &params.to_query())
        .await?;
    Ok(ok("Payments retrieved", page))
}
