//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, OrderId, UserId};
use domain::{
    Actor, Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus, PaymentType,
    Provider,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{OrderStore, PageQuery, PaymentStore, PostgresStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/0001_create_orders_and_payments.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE orders, payments")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn make_order(user_id: UserId) -> Order {
    let items = vec![
        OrderItem::new("SKU-001", "Widget A", 2, Money::from_cents(5000), None),
        OrderItem::new("SKU-002", "Widget B", 1, Money::from_cents(3000), None),
    ];
    Order::new(user_id, items, None, None, "USD", Actor::System).unwrap()
}

fn make_payment(user_id: UserId, order_id: OrderId) -> Payment {
    Payment::new(
        user_id,
        order_id,
        Money::from_cents(14440),
        "USD",
        PaymentMethod::CreditCard,
        PaymentType::Full,
        Provider::Stripe,
    )
}

#[tokio::test]
#[serial]
async fn order_roundtrip_preserves_document() {
    let store = get_test_store().await;
    let order = make_order(UserId::new());

    OrderStore::insert(&store, &order).await.unwrap();
    let fetched = OrderStore::get(&store, order.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, order.id);
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.total_amount.cents(), 13000);
    assert_eq!(fetched.gst_amount.cents(), 1440);
    assert_eq!(fetched.status_log.len(), 1);
}

#[tokio::test]
#[serial]
async fn order_update_replaces_document() {
    let store = get_test_store().await;
    let mut order = make_order(UserId::new());
    OrderStore::insert(&store, &order).await.unwrap();

    order
        .update_status(OrderStatus::Processing, None, Actor::System)
        .unwrap();
    OrderStore::update(&store, &order).await.unwrap();

    let fetched = OrderStore::get(&store, order.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, OrderStatus::Processing);
    assert_eq!(fetched.status_log.len(), 2);
}

#[tokio::test]
#[serial]
async fn order_update_missing_fails() {
    let store = get_test_store().await;
    let order = make_order(UserId::new());

    let result = OrderStore::update(&store, &order).await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
#[serial]
async fn order_listing_filters_and_paginates() {
    let store = get_test_store().await;
    let user = UserId::new();

    for _ in 0..3 {
        OrderStore::insert(&store, &make_order(user)).await.unwrap();
    }
    let mut cancelled = make_order(user);
    cancelled.cancel(Actor::System, "test").unwrap();
    OrderStore::insert(&store, &cancelled).await.unwrap();
    OrderStore::insert(&store, &make_order(UserId::new()))
        .await
        .unwrap();

    let page = OrderStore::list(&store, &PageQuery::new()).await.unwrap();
    assert_eq!(page.total, 5);

    let page = OrderStore::list_by_user(&store, user, &PageQuery::new().status("pending"))
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let page = OrderStore::list_by_user(&store, user, &PageQuery::new().page(2).limit(2))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pages, 2);
}

#[tokio::test]
#[serial]
async fn payment_gateway_id_lookup() {
    let store = get_test_store().await;
    let mut payment = make_payment(UserId::new(), OrderId::new());
    PaymentStore::insert(&store, &payment).await.unwrap();

    payment.gateway_payment_id = Some("pi_test_123".to_string());
    payment.set_status(PaymentStatus::Processing).unwrap();
    PaymentStore::update(&store, &payment).await.unwrap();

    let found = store
        .get_by_gateway_id("pi_test_123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, payment.id);
    assert_eq!(found.status, PaymentStatus::Processing);

    assert!(store.get_by_gateway_id("pi_other").await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn payment_refund_history_survives_roundtrip() {
    let store = get_test_store().await;
    let mut payment = make_payment(UserId::new(), OrderId::new());
    payment.set_status(PaymentStatus::Completed).unwrap();
    payment
        .record_refund(Some(Money::from_cents(4000)), "damaged", Some("re_1".into()))
        .unwrap();

    PaymentStore::insert(&store, &payment).await.unwrap();
    let fetched = PaymentStore::get(&store, payment.id).await.unwrap().unwrap();

    assert_eq!(fetched.status, PaymentStatus::PartiallyRefunded);
    assert_eq!(fetched.refund_details.len(), 1);
    assert_eq!(fetched.refunded_total().cents(), 4000);
    assert_eq!(
        fetched.refund_details[0].gateway_refund_id.as_deref(),
        Some("re_1")
    );
}

#[tokio::test]
#[serial]
async fn payments_list_by_order_and_user() {
    let store = get_test_store().await;
    let user = UserId::new();
    let order_id = OrderId::new();

    PaymentStore::insert(&store, &make_payment(user, order_id))
        .await
        .unwrap();
    PaymentStore::insert(&store, &make_payment(user, OrderId::new()))
        .await
        .unwrap();
    PaymentStore::insert(&store, &make_payment(UserId::new(), order_id))
        .await
        .unwrap();

    let page = store
        .list_by_order(order_id, &PageQuery::new())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = PaymentStore::list_by_user(&store, user, &PageQuery::new())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}
