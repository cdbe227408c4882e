//! Application configuration loaded from environment variables.

use std::time::Duration;

use checkout::{CheckoutConfig, DEFAULT_ORDER_TIMEOUT};
use domain::{CartServiceConfig, DEFAULT_MAX_CONFLICT_RETRIES};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset keeps carts in memory
/// - `PRODUCT_SERVICE_URL`: product catalog base URL (default: `http://localhost:8081`)
/// - `ORDER_SERVICE_URL`: order service base URL (default: `http://localhost:8082`)
/// - `ORDER_TIMEOUT_SECS`: bound on the remote order call (default: `10`)
/// - `MAX_CONFLICT_RETRIES`: extra attempts after a cart write conflict (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub product_service_url: String,
    pub order_service_url: String,
    pub order_timeout: Duration,
    pub max_conflict_retries: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
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
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            product_service_url: env_or("PRODUCT_SERVICE_URL", &defaults.product_service_url),
            order_service_url: env_or("ORDER_SERVICE_URL", &defaults.order_service_url),
            order_timeout: Duration::from_secs(env_parse(
                "ORDER_TIMEOUT_SECS",
                defaults.order_timeout.as_secs(),
            )),
            max_conflict_retries: env_parse("MAX_CONFLICT_RETRIES", defaults.max_conflict_retries),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cart_service_config(&self) -> CartServiceConfig {
        CartServiceConfig {
            max_conflict_retries: self.max_conflict_retries,
        }
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            order_timeout: self.order_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            product_service_url: "http://localhost:8081".to_string(),
            order_service_url: "http://localhost:8082".to_string(),
            order_timeout: DEFAULT_ORDER_TIMEOUT,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}
