//! Application state management for the gateway
//!
//! Everything with "exactly one instance per process" semantics lives here
//! and is injected into handlers: the provider registry, the rate limiter
//! with its startup-selected backend, the shared HTTP client, metrics, and
//! health checking.

use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::{Config, RateLimitBackend};
use crate::error::{ApiError, Result};
use crate::services::{
    health::HealthService,
    metrics::MetricsService,
    rate_limiter::{MemoryStore, RateLimiterService, RedisStore},
};
use easyprompt_providers::ProviderRegistry;

/// Application mode indicating what services are available
#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    /// Full functionality with the configured rate-limit backend
    Full,
    /// Redis was configured but unreachable; running on in-memory counters
    Degraded,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub mode: AppMode,
    pub redis_manager: Option<ConnectionManager>,
    pub http_client: Client,
    pub providers: Arc<ProviderRegistry>,
    pub rate_limiter: Arc<RateLimiterService>,
    pub health_service: Arc<HealthService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    /// Initialize application state with the configured backend.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application state...");

        let http_client = create_http_client(&config)?;
        info!("HTTP client initialized");

        let metrics = Arc::new(MetricsService::new()?);
        info!("Metrics service initialized");

        let providers = Arc::new(ProviderRegistry::new(http_client.clone()));
        info!("Provider registry initialized");

        let (redis_manager, rate_limiter) = match config.rate_limit.backend {
            RateLimitBackend::Redis => {
                let manager = create_redis_manager(&config).await?;
                info!("Redis connection manager initialized");
                let store = Arc::new(RedisStore::new(
                    manager.clone(),
                    config.rate_limit.key_prefix.clone(),
                ));
                (
                    Some(manager),
                    Arc::new(RateLimiterService::new(store, config.rate_limit.clone())),
                )
            }
            RateLimitBackend::Memory => {
                let store = Arc::new(MemoryStore::new(config.rate_limit.cleanup_interval()));
                (
                    None,
                    Arc::new(RateLimiterService::new(store, config.rate_limit.clone())),
                )
            }
        };
        info!(
            backend = rate_limiter.backend_name(),
            "Rate limiter initialized"
        );

        let health_service = Arc::new(HealthService::new(
            redis_manager.clone(),
            providers.clone(),
            config.environment.clone(),
        ));

        info!("All services initialized successfully");

        Ok(Self {
            config,
            mode: AppMode::Full,
            redis_manager,
            http_client,
            providers,
            rate_limiter,
            health_service,
            metrics,
        })
    }

    /// Initialize application state in degraded mode: in-memory rate
    /// limiting regardless of the configured backend.
    pub async fn new_degraded(config: Config) -> Result<Self> {
        warn!("Initializing application state in degraded mode...");

        let http_client = create_http_client(&config)?;
        let metrics = Arc::new(MetricsService::new()?);
        let providers = Arc::new(ProviderRegistry::new(http_client.clone()));

        let store = Arc::new(MemoryStore::new(config.rate_limit.cleanup_interval()));
        let rate_limiter = Arc::new(RateLimiterService::new(store, config.rate_limit.clone()));

        let health_service = Arc::new(HealthService::new(
            None,
            providers.clone(),
            config.environment.clone(),
        ));

        warn!("Application initialized in degraded mode - rate limits are per-instance");

        Ok(Self {
            config,
            mode: AppMode::Degraded,
            redis_manager: None,
            http_client,
            providers,
            rate_limiter,
            health_service,
            metrics,
        })
    }

    pub fn is_degraded(&self) -> bool {
        self.mode == AppMode::Degraded
    }
}

/// Create Redis connection manager and verify the connection.
async fn create_redis_manager(config: &Config) -> Result<ConnectionManager> {
    let client = redis::Client::open(config.redis.url.clone()).map_err(ApiError::Redis)?;

    let connect = ConnectionManager::new(client);
    let timeout = Duration::from_secs(config.redis.connection_timeout_seconds);
    let manager = tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| ApiError::service_unavailable("redis"))?
        .map_err(ApiError::Redis)?;

    let mut conn = manager.clone();
    redis::cmd("PING")
        .query_async::<_, String>(&mut conn)
        .await
        .map_err(ApiError::Redis)?;

    Ok(manager)
}

/// Create HTTP client shared by all provider adapters.
fn create_http_client(config: &Config) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .user_agent(format!("easyprompt-gateway/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ApiError::HttpClient)?;

    Ok(client)
}
