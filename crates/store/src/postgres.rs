//! PostgreSQL-backed order and payment stores.

use async_trait::async_trait;
use common::{OrderId, PaymentId, UserId};
use domain::{Order, Payment};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Page, PageQuery, Result, StoreError, order::OrderStore, payment::PaymentStore};

/// PostgreSQL-backed store implementing both the order and payment
/// contracts over one connection pool.
///
/// Records are stored as full JSONB documents; the columns used for
/// filtering and sorting (owner, status, timestamps) are lifted out at
/// write time.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn order_from_row(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    fn payment_from_row(row: PgRow) -> Result<Payment> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    /// Builds `WHERE`/`ORDER BY`/`LIMIT` clauses shared by every list
    /// query. Only allowlisted column names reach the SQL string; all
    /// values are bound.
    fn list_clauses(query: &PageQuery, mut param_count: usize) -> String {
        let mut sql = String::new();

        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.from_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.to_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        let key = query.sort_key();
        let direction = if key.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {} {direction}", key.field.column()));

        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));

        sql
    }

    fn count_clauses(query: &PageQuery, mut param_count: usize) -> String {
        let mut sql = String::new();
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.from_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.to_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }
        sql
    }

    async fn list_orders_where(
        &self,
        scope_column: Option<&str>,
        scope_id: Option<Uuid>,
        query: &PageQuery,
    ) -> Result<Page<Order>> {
        let (base_filter, scoped_params) = match scope_column {
            Some(column) => (format!(" AND {column} = $1"), 1),
            None => (String::new(), 0),
        };

        let mut sql = format!("SELECT document FROM orders WHERE 1=1{base_filter}");
        sql.push_str(&Self::list_clauses(query, scoped_params));

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(id) = scope_id {
            sqlx_query = sqlx_query.bind(id);
        }
        if let Some(status) = &query.status {
            sqlx_query = sqlx_query.bind(status);
        }
        if let Some(from) = query.from_date {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.to_date {
            sqlx_query = sqlx_query.bind(to);
        }
        sqlx_query = sqlx_query
            .bind(query.limit.max(1) as i64)
            .bind(query.offset() as i64);

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Self::order_from_row)
            .collect::<Result<Vec<_>>>()?;

        let mut count_sql = format!("SELECT COUNT(*) FROM orders WHERE 1=1{base_filter}");
        count_sql.push_str(&Self::count_clauses(query, scoped_params));

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(id) = scope_id {
            count_query = count_query.bind(id);
        }
        if let Some(status) = &query.status {
            count_query = count_query.bind(status);
        }
        if let Some(from) = query.from_date {
            count_query = count_query.bind(from);
        }
        if let Some(to) = query.to_date {
            count_query = count_query.bind(to);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok(Page::new(items, total as u64, query))
    }

    async fn list_payments_where(
        &self,
        scope_column: &str,
        scope_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<Payment>> {
        let base_filter = format!(" AND {scope_column} = $1");

        let mut sql = format!("SELECT document FROM payments WHERE 1=1{base_filter}");
        sql.push_str(&Self::list_clauses(query, 1));

        let mut sqlx_query = sqlx::query(&sql).bind(scope_id);
        if let Some(status) = &query.status {
            sqlx_query = sqlx_query.bind(status);
        }
        if let Some(from) = query.from_date {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.to_date {
            sqlx_query = sqlx_query.bind(to);
        }
        sqlx_query = sqlx_query
            .bind(query.limit.max(1) as i64)
            .bind(query.offset() as i64);

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Self::payment_from_row)
            .collect::<Result<Vec<_>>>()?;

        let mut count_sql = format!("SELECT COUNT(*) FROM payments WHERE 1=1{base_filter}");
        count_sql.push_str(&Self::count_clauses(query, 1));

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(scope_id);
        if let Some(status) = &query.status {
            count_query = count_query.bind(status);
        }
        if let Some(from) = query.from_date {
            count_query = count_query.bind(from);
        }
        if let Some(to) = query.to_date {
            count_query = count_query.bind(to);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok(Page::new(items, total as u64, query))
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(document)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn update(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, document = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(document)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order.id));
        }
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::order_from_row).transpose()
    }

    async fn list(&self, query: &PageQuery) -> Result<Page<Order>> {
        self.list_orders_where(None, None, query).await
    }

    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Order>> {
        self.list_orders_where(Some("user_id"), Some(user_id.as_uuid()), query)
            .await
    }
}

#[async_trait]
impl PaymentStore for PostgresStore {
    #[tracing::instrument(skip(self, payment), fields(payment_id = %payment.id))]
    async fn insert(&self, payment: &Payment) -> Result<()> {
        let document = serde_json::to_value(payment)?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, order_id, gateway_payment_id, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(&payment.gateway_payment_id)
        .bind(payment.status.as_str())
        .bind(document)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, payment), fields(payment_id = %payment.id))]
    async fn update(&self, payment: &Payment) -> Result<()> {
        let document = serde_json::to_value(payment)?;

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET gateway_payment_id = $2, status = $3, document = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.gateway_payment_id)
        .bind(payment.status.as_str())
        .bind(document)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PaymentNotFound(payment.id));
        }
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT document FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::payment_from_row).transpose()
    }

    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT document FROM payments WHERE gateway_payment_id = $1")
            .bind(gateway_payment_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::payment_from_row).transpose()
    }

    async fn list_by_order(&self, order_id: OrderId, query: &PageQuery) -> Result<Page<Payment>> {
        self.list_payments_where("order_id", order_id.as_uuid(), query)
            .await
    }

    async fn list_by_user(&self, user_id: UserId, query: &PageQuery) -> Result<Page<Payment>> {
        self.list_payments_where("user_id", user_id.as_uuid(), query)
            .await
    }
}
