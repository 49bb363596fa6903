//! Payment lifecycle and webhook endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, OrderId, PaymentId, UserId};
use domain::{PaymentMethod, PaymentType, Provider};
use engine::{InitiatePaymentRequest, Inventory, Users};
use serde::Deserialize;
use serde_json::json;
use store::{OrderStore, PaymentStore};

use super::{AppState, ListParams, ok};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct InitiatePaymentBody {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub provider: Provider,
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub return_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct WebhookBody {
    pub event: String,
    pub gateway_payment_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
pub struct RefundBody {
    pub amount: Option<Money>,
    pub reason: Option<String>,
}

// -- Handlers --

/// POST /payments — initiate a payment for an order.
#[tracing::instrument(skip(state, body), fields(order_id = %body.order_id))]
pub async fn initiate<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Json(body): Json<InitiatePaymentBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let initiation = state
        .payments
        .initiate_payment(InitiatePaymentRequest {
            user_id: body.user_id,
            order_id: body.order_id,
            method: body.method,
            provider: body.provider,
            amount: body.amount,
            currency: body.currency,
            payment_type: body.payment_type,
            return_url: body.return_url,
            metadata: body.metadata,
        })
        .await?;
    Ok((StatusCode::CREATED, ok("Payment initiated", initiation)))
}

/// POST /payments/webhook/{gateway} — apply a provider notification.
///
/// Always answers 200 so providers do not retry forever; the outcome
/// (including unknown gateways and duplicate deliveries) is in the body.
#[tracing::instrument(skip(state, body))]
pub async fn webhook<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(gateway): Path<String>,
    Json(body): Json<WebhookBody>,
) -> Json<serde_json::Value>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let Some(provider) = Provider::parse(&gateway) else {
        return Json(json!({
            "success": false,
            "error": { "message": format!("Unknown gateway: {gateway}") },
        }));
    };

    match state
        .payments
        .process_webhook(provider, &body.event, &body.gateway_payment_id, body.data)
        .await
    {
        Ok(outcome) => {
            let message = outcome.message.clone();
            ok(&message, outcome)
        }
        Err(e) => {
            tracing::error!(%gateway, error = %e, "webhook processing failed");
            Json(json!({
                "success": false,
                "error": { "message": e.to_string() },
            }))
        }
    }
}

/// GET /payments/{id} — fetch one payment.
#[tracing::instrument(skip(state))]
pub async fn get<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<PaymentId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let payment = state.payments.get_payment(id).await?;
    Ok(ok("Payment retrieved", payment))
}

/// POST /payments/{id}/refund — refund a completed payment.
#[tracing::instrument(skip(state, body))]
pub async fn refund<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<PaymentId>,
    Json(body): Json<RefundBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let payment = state
        .payments
        .refund_payment(id, body.amount, body.reason)
        .await?;
    Ok(ok("Payment refunded", payment))
}

/// POST /payments/{id}/abort — abort an unfinished payment.
#[tracing::instrument(skip(state))]
pub async fn abort<S, P, I, U>(
    State(state): State<Arc<AppState<S, P, I, U>>>,
    Path(id): Path<PaymentId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let payment = state.payments.abort_payment(id).await?;
    Ok(ok("Payment aborted", payment))
}

/// GET /users/{user_id}/payments — list one user's payments.
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
        .payments
        .list_payments_by_user(user_id, &params.to_query())
        .await?;
    Ok(ok("Payments retrieved", page))
}
