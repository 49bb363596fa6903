//! Persistence layer: order and payment stores.
//!
//! Each record type has a storage trait with two implementations: an
//! in-memory store for tests and a PostgreSQL store backed by sqlx.
//! Records are whole JSONB documents, so a single write covers the order
//! together with its items and status log.

pub mod error;
pub mod order;
pub mod payment;
pub mod postgres;
pub mod query;

pub use error::{Result, StoreError};
pub use order::{InMemoryOrderStore, OrderStore};
pub use payment::{InMemoryPaymentStore, PaymentStore};
pub use postgres::PostgresStore;
pub use query::{DEFAULT_LIMIT, DEFAULT_SORT, Page, PageQuery, SortField, SortKey};
