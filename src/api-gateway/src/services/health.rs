//! Health check service for monitoring gateway status

use std::sync::Arc;

use chrono::Utc;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use easyprompt_providers::ProviderRegistry;
use easyprompt_shared::{HealthState, ServiceHealth, SystemInfo};

/// Health check service
#[derive(Clone)]
pub struct HealthService {
    redis_manager: Option<ConnectionManager>,
    providers: Arc<ProviderRegistry>,
    environment: String,
}

impl HealthService {
    pub fn new(
        redis_manager: Option<ConnectionManager>,
        providers: Arc<ProviderRegistry>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            redis_manager,
            providers,
            environment: environment.into(),
        }
    }

    /// Check health of all components: the rate-limit backend and every
    /// registered provider.
    pub async fn check_all(&self) -> Vec<ServiceHealth> {
        let mut services = vec![self.check_redis().await];
        services.extend(self.check_providers().await);
        services
    }

    /// Collapse the per-component rows into one overall state.
    pub async fn get_health_status(&self) -> HealthState {
        let services = self.check_all().await;

        if services.iter().any(|s| s.status == HealthState::Unhealthy) {
            HealthState::Unhealthy
        } else if services.iter().any(|s| s.status == HealthState::Degraded) {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        }
    }

    async fn check_redis(&self) -> ServiceHealth {
        match &self.redis_manager {
            Some(manager) => {
                let start = std::time::Instant::now();
                let mut conn = manager.clone();

                match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
                    Ok(_) => {
                        let response_time = start.elapsed().as_millis() as f64;
                        debug!(response_time_ms = response_time, "Redis health check passed");
                        ServiceHealth {
                            name: "redis".to_string(),
                            status: HealthState::Healthy,
                            response_time_ms: Some(response_time),
                            last_check: Utc::now(),
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        ServiceHealth {
                            name: "redis".to_string(),
                            status: HealthState::Unhealthy,
                            response_time_ms: None,
                            last_check: Utc::now(),
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
            None => ServiceHealth {
                name: "redis".to_string(),
                status: HealthState::Degraded,
                response_time_ms: None,
                last_check: Utc::now(),
                error: Some("Not configured (in-memory rate limiting)".to_string()),
            },
        }
    }

    /// A provider being down degrades the gateway but does not make it
    /// unhealthy: the other providers keep working.
    async fn check_providers(&self) -> Vec<ServiceHealth> {
        self.providers
            .available()
            .await
            .into_iter()
            .map(|info| ServiceHealth {
                name: format!("provider:{}", info.metadata.name),
                status: if info.available {
                    HealthState::Healthy
                } else {
                    HealthState::Degraded
                },
                response_time_ms: info.latency_ms.map(|ms| ms as f64),
                last_check: Utc::now(),
                error: None,
            })
            .collect()
    }

    pub fn get_system_info(&self) -> SystemInfo {
        SystemInfo {
            platform_name: "EasyPrompt Gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: self.environment.clone(),
            api_version: "v1".to_string(),
            features: vec![
                "analyze".to_string(),
                "optimize".to_string(),
                "preview".to_string(),
                "compare".to_string(),
            ],
        }
    }
}
