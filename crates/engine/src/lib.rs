//! Order and payment lifecycle engines.
//!
//! The order engine drives order creation, status transitions,
//! cancellations, and pricing against an order store, with inventory and
//! user services as best-effort collaborators. The payment engine drives
//! payments against a gateway registry and pushes order status changes
//! through the [`Orders`] contract rather than writing order records
//! itself.

pub mod error;
pub mod order_engine;
pub mod payment_engine;
pub mod services;

pub use error::{EngineError, Result};
pub use order_engine::{
    CreateOrderRequest, DEFAULT_CANCEL_REASON, DEFAULT_ITEM_CANCEL_REASON, ITEM_REMOVED_REASON,
    NewOrderItem, OrderDetail, OrderEngine, OrderWithShipping, Orders,
};
pub use payment_engine::{
    InitiatePaymentRequest, PaymentEngine, PaymentInitiation, WebhookOutcome,
};
pub use services::{
    CartLine, InMemoryInventory, InMemoryUsers, Inventory, ProductInfo, UserInfo, Users,
};
