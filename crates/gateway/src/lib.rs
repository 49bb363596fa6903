//! Payment provider abstraction.
//!
//! One [`PaymentGateway`] implementation per provider, each owning its
//! event-name translation table and normalizing provider failures into a
//! uniform [`GatewayResponse`]. The [`GatewayRegistry`] selects a gateway
//! by provider at the payment engine boundary.

pub mod mock;
pub mod provider;
pub mod razorpay;
pub mod registry;
pub mod response;
pub mod stripe;

pub use mock::MockGateway;
pub use provider::PaymentGateway;
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use registry::{GatewayConfig, GatewayRegistry};
pub use response::{GatewayAmount, GatewayResponse, InitiateRequest};
pub use stripe::{StripeConfig, StripeGateway};
