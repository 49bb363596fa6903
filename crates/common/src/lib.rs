//! Shared types used across the commerce core workspace.

mod ids;
mod money;

pub use ids::{ItemId, OrderId, PaymentId, ProductId, UserId};
pub use money::Money;
