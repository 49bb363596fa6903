//! Application configuration loaded from environment variables.

use gateway::{GatewayConfig, RazorpayConfig, StripeConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; in-memory stores
///   are used when unset
/// - `STRIPE_SECRET_KEY` / `STRIPE_WEBHOOK_SECRET`
/// - `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            razorpay_key_id: std::env::var("RAZORPAY_KEY_ID").ok(),
            razorpay_key_secret: std::env::var("RAZORPAY_KEY_SECRET").ok(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gateway credentials for the provider registry. Providers without
    /// credentials are simply not registered.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            stripe: self.stripe_secret_key.clone().map(|secret_key| StripeConfig {
                secret_key,
                webhook_secret: self.stripe_webhook_secret.clone(),
            }),
            razorpay: match (&self.razorpay_key_id, &self.razorpay_key_secret) {
                (Some(key_id), Some(key_secret)) => Some(RazorpayConfig {
                    key_id: key_id.clone(),
                    key_secret: key_secret.clone(),
                }),
                _ => None,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            razorpay_key_id: None,
            razorpay_key_secret: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn gateway_config_requires_both_razorpay_keys() {
        let config = Config {
            razorpay_key_id: Some("rzp_test".to_string()),
            ..Config::default()
        };
        assert!(config.gateway_config().razorpay.is_none());

        let config = Config {
            stripe_secret_key: Some("sk_test".to_string()),
            ..Config::default()
        };
        assert!(config.gateway_config().stripe.is_some());
    }
}
