//! Application configuration loaded from environment variables.

use domain::{Money, TaxRate};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `SHIPPING_FLAT_RATE`: shipping charge in whole units (default `80`)
/// - `GATEWAY_KEY_ID`: publishable gateway key (default `"key_sandbox"`)
/// - `GATEWAY_KEY_SECRET`: payment signing secret (default `"sandbox-secret"`)
/// - `TAX_RATE_BPS`: tax rate in basis points (default `1800`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub shipping_flat_rate: i64,
    pub gateway_key_id: String,
    pub gateway_key_secret: String,
    pub tax_rate_bps: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", &defaults.host),
            port: env_parse("PORT", defaults.port),
            log_level: env_or("RUST_LOG", &defaults.log_level),
            shipping_flat_rate: env_parse("SHIPPING_FLAT_RATE", defaults.shipping_flat_rate),
            gateway_key_id: env_or("GATEWAY_KEY_ID", &defaults.gateway_key_id),
            gateway_key_secret: env_or("GATEWAY_KEY_SECRET", &defaults.gateway_key_secret),
            tax_rate_bps: env_parse("TAX_RATE_BPS", defaults.tax_rate_bps),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the flat shipping charge.
    pub fn shipping(&self) -> Money {
        Money::from_units(self.shipping_flat_rate)
    }

    /// Returns the tax rate.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_basis_points(self.tax_rate_bps)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            shipping_flat_rate: 80,
            gateway_key_id: "key_sandbox".to_string(),
            gateway_key_secret: "sandbox-secret".to_string(),
            tax_rate_bps: 1800,
        }
    }
}
