//! HTTP API server for the order and payment engines.
//!
//! Exposes REST endpoints for the order lifecycle, payment initiation,
//! gateway webhooks, and refunds, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use engine::{
    InMemoryInventory, InMemoryUsers, Inventory, OrderEngine, PaymentEngine, Users,
};
use gateway::{GatewayConfig, GatewayRegistry};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryOrderStore, InMemoryPaymentStore, OrderStore, PaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P, I, U>(
    state: Arc<AppState<S, P, I, U>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + 'static,
    P: PaymentStore + 'static,
    I: Inventory + 'static,
    U: Users + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, P, I, U>))
        .route("/orders", get(routes::orders::list::<S, P, I, U>))
        .route("/orders/{id}", get(routes::orders::get::<S, P, I, U>))
        .route(
            "/orders/{id}/detail",
            get(routes::orders::detail::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/shipping",
            get(routes::orders::shipping::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/cancel",
            post(routes::orders::cancel::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/discount",
            post(routes::orders::apply_discount::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/items",
            get(routes::orders::items::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/items/{item_id}",
            patch(routes::orders::update_item::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/items/{item_id}",
            delete(routes::orders::delete_item::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/items/{item_id}/cancel",
            post(routes::orders::cancel_item::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/status-log",
            get(routes::orders::status_log::<S, P, I, U>),
        )
        .route(
            "/orders/{id}/payments",
            get(routes::orders::payments::<S, P, I, U>),
        )
        .route(
            "/users/{user_id}/orders",
            get(routes::orders::list_for_user::<S, P, I, U>),
        )
        .route("/payments", post(routes::payments::initiate::<S, P, I, U>))
        .route(
            "/payments/webhook/{gateway}",
            post(routes::payments::webhook::<S, P, I, U>),
        )
        .route("/payments/{id}", get(routes::payments::get::<S, P, I, U>))
        .route(
            "/payments/{id}/refund",
            post(routes::payments::refund::<S, P, I, U>),
        )
        .route(
            "/payments/{id}/abort",
            post(routes::payments::abort::<S, P, I, U>),
        )
        .route(
            "/users/{user_id}/payments",
            get(routes::payments::list_for_user::<S, P, I, U>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires stores, collaborator services, and the gateway registry into
/// shared application state. The order engine is shared with the payment
/// engine through its [`engine::Orders`] contract.
pub fn create_state<S, P, I, U>(
    orders: S,
    payments: P,
    inventory: I,
    users: U,
    registry: GatewayRegistry,
) -> Arc<AppState<S, P, I, U>>
where
    S: OrderStore + 'static,
    P: PaymentStore + Clone + 'static,
    I: Inventory + 'static,
    U: Users + Clone + 'static,
{
    let order_engine = Arc::new(OrderEngine::new(
        orders,
        payments.clone(),
        inventory,
        users.clone(),
    ));
    let payment_engine = PaymentEngine::new(payments, order_engine.clone(), users, registry);
    Arc::new(AppState {
        orders: order_engine,
        payments: payment_engine,
    })
}

/// Creates application state backed entirely by in-memory stores and
/// mock collaborator services.
pub fn create_default_state(
    gateway_config: GatewayConfig,
) -> (
    Arc<AppState<InMemoryOrderStore, InMemoryPaymentStore, InMemoryInventory, InMemoryUsers>>,
    InMemoryInventory,
    InMemoryUsers,
) {
    let inventory = InMemoryInventory::new();
    let users = InMemoryUsers::new();
    let state = create_state(
        InMemoryOrderStore::new(),
        InMemoryPaymentStore::new(),
        inventory.clone(),
        users.clone(),
        GatewayRegistry::from_config(gateway_config),
    );
    (state, inventory, users)
}
