//! Application configuration
//!
//! Settings load from an optional YAML file plus environment variables with
//! the `APP` prefix and `__` separator (e.g. `APP__RATE_LIMIT__BACKEND=redis`),
//! via the `config` crate. Every section has defaults so the gateway starts
//! with no configuration at all.
//!
//! Per-provider API keys are deliberately not part of this surface: adapters
//! read `<PROVIDER>_API_KEY` from the environment directly.

use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub timeout_seconds: u64,
}

/// Which rate-limit store backs the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// In-process counters. Per-instance quotas, fixed window.
    Memory,
    /// Shared Redis counters. Cross-instance quotas, sliding window.
    Redis,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Maximum requests per identifier per window.
    pub max_requests: u32,
    pub window_seconds: u64,
    pub backend: RateLimitBackend,
    pub key_prefix: String,
    pub cleanup_interval_seconds: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}

/// Redis configuration (only used with the redis rate-limit backend)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from config files and environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::File::with_name(&format!("config/environments/{}", environment))
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            redis: RedisConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            timeout_seconds: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 20,
            window_seconds: 60,
            backend: RateLimitBackend::Memory,
            key_prefix: "easyprompt:ratelimit".to_string(),
            cleanup_interval_seconds: 60,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1/".to_string(),
            connection_timeout_seconds: 5,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = Config::default();
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.rate_limit.backend, RateLimitBackend::Memory);
        assert_eq!(config.server.port, 8080);
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_window_durations() {
        let config = RateLimitConfig::default();
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: RateLimitBackend = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(backend, RateLimitBackend::Redis);
    }
}
