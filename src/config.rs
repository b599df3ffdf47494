//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;

use crate::error::{Result, ServiceError};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Invalid values (unparsable numbers, zero capacity) are a fatal
/// configuration error at startup rather than silently replaced.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of orders the cache can hold
    pub cache_capacity: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Path to the JSON file seeding the order store
    pub store_path: String,
    /// Stream broker addresses (comma-separated)
    pub stream_brokers: String,
    /// Stream topic carrying order events
    pub stream_topic: String,
    /// Consumer group identifier
    pub stream_group: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cached orders, must be > 0 (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_PATH` - Order store seed file (default: data/orders.json)
    /// - `STREAM_BROKERS` - Broker addresses (default: localhost:9092)
    /// - `STREAM_TOPIC` - Event topic (default: orders)
    /// - `STREAM_GROUP` - Consumer group (default: order_cache)
    pub fn from_env() -> Result<Self> {
        let cache_capacity = parse_var("CACHE_CAPACITY", 1000)?;
        if cache_capacity == 0 {
            return Err(ServiceError::Config(
                "CACHE_CAPACITY must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            cache_capacity,
            server_port: parse_var("SERVER_PORT", 3000)?,
            store_path: env::var("STORE_PATH").unwrap_or_else(|_| "data/orders.json".to_string()),
            stream_brokers: env::var("STREAM_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            stream_topic: env::var("STREAM_TOPIC").unwrap_or_else(|_| "orders".to_string()),
            stream_group: env::var("STREAM_GROUP").unwrap_or_else(|_| "order_cache".to_string()),
        })
    }
}

/// Parses a numeric environment variable, defaulting when unset and failing
/// when set but unparsable.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ServiceError::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            server_port: 3000,
            store_path: "data/orders.json".to_string(),
            stream_brokers: "localhost:9092".to_string(),
            stream_topic: "orders".to_string(),
            stream_group: "order_cache".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.stream_topic, "orders");
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();

        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_PATH");
        env::remove_var("STREAM_BROKERS");
        env::remove_var("STREAM_TOPIC");
        env::remove_var("STREAM_GROUP");

        let config = Config::from_env().unwrap();
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_path, "data/orders.json");
        assert_eq!(config.stream_group, "order_cache");
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("CACHE_CAPACITY", "0");
        let result = Config::from_env();
        env::remove_var("CACHE_CAPACITY");

        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_config_rejects_unparsable_port() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("SERVER_PORT", "not-a-port");
        let result = Config::from_env();
        env::remove_var("SERVER_PORT");

        assert!(matches!(result, Err(ServiceError::Config(_))));
    }
}
