//! Order record, line items, status log, and pricing.

mod model;
mod status;

pub use model::{
    Actor, Discount, GST_RATE_PERCENT, ItemCancellation, Order, OrderItem, StatusLogEntry,
    StockAdjustment,
};
pub use status::OrderStatus;

use common::ItemId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not an edge in the order graph.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order cannot be cancelled in its current status.
    #[error("Cannot cancel order in {status} status")]
    CannotCancel { status: OrderStatus },

    /// Items can only be changed while the order is open for modification.
    #[error("Cannot modify items of an order in {status} status")]
    ItemsNotEditable { status: OrderStatus },

    /// Discounts apply to pending orders only.
    #[error("Can only apply discount to pending orders (current: {status})")]
    DiscountNotAllowed { status: OrderStatus },

    /// A fixed discount larger than the order total is rejected.
    #[error("Discount amount {discount} cannot exceed order total {total}")]
    DiscountExceedsTotal {
        discount: common::Money,
        total: common::Money,
    },

    /// Line item not found on this order.
    #[error("Order item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// A cancelled item cannot be updated.
    #[error("Order item {item_id} is cancelled")]
    ItemCancelled { item_id: ItemId },

    /// Quantities start at one; zero means cancel the item instead.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Orders carry at least one line item.
    #[error("Order has no items")]
    NoItems,
}
