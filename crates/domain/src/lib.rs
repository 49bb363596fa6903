//! Domain layer for the commerce core.
//!
//! Pure data model: orders with embedded line items and an append-only
//! status log, payments with refund history, and the status machines that
//! guard every transition. No I/O lives here; the engines in the `engine`
//! crate drive these types against a store and external collaborators.

pub mod order;
pub mod payment;

pub use order::{
    Actor, Discount, GST_RATE_PERCENT, ItemCancellation, Order, OrderError, OrderItem,
    OrderStatus, StatusLogEntry, StockAdjustment,
};
pub use payment::{
    Payment, PaymentError, PaymentMethod, PaymentStatus, PaymentType, Provider, RefundDetail,
};
