//! Provider registry: configuration-driven gateway selection.

use std::collections::HashMap;
use std::sync::Arc;

use domain::Provider;

use crate::{
    PaymentGateway,
    razorpay::{RazorpayConfig, RazorpayGateway},
    stripe::{StripeConfig, StripeGateway},
};

/// Credentials for every configured provider. A provider left as `None`
/// is simply not registered.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub stripe: Option<StripeConfig>,
    pub razorpay: Option<RazorpayConfig>,
}

/// Maps providers to their gateway implementations.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<Provider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Builds a registry from credentials, registering one gateway per
    /// configured provider.
    pub fn from_config(config: GatewayConfig) -> Self {
        let mut registry = Self::default();
        if let Some(stripe) = config.stripe {
            registry.register(Arc::new(StripeGateway::new(stripe)));
        }
        if let Some(razorpay) = config.razorpay {
            registry.register(Arc::new(RazorpayGateway::new(razorpay)));
        }
        registry
    }

    /// Registers a gateway under its own provider name, replacing any
    /// previous registration.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    /// Looks up the gateway for a provider.
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(&provider).cloned()
    }

    /// Providers currently registered.
    pub fn providers(&self) -> Vec<Provider> {
        self.gateways.keys().copied().collect()
    }
}
