//! Provider registry: one adapter instance per provider for the life of
//! the process
//!
//! The registry is constructed once at startup and handed to request
//! handlers by reference (no hidden global). `available()` is an
//! aggregation, not a cache: every call re-probes.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;
use tracing::warn;

use crate::adapters::{AnthropicProvider, GoogleProvider, OllamaProvider, OpenAiProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::AiProvider;
use easyprompt_shared::{HealthStatus, ProviderInfo, ProviderType};

pub struct ProviderRegistry {
    providers: HashMap<ProviderType, Arc<dyn AiProvider>>,
}

impl ProviderRegistry {
    /// Build the default registry with all four adapters sharing one HTTP
    /// client.
    pub fn new(http_client: Client) -> Self {
        Self::from_providers(vec![
            Arc::new(AnthropicProvider::new(http_client.clone())),
            Arc::new(OpenAiProvider::new(http_client.clone())),
            Arc::new(GoogleProvider::new(http_client.clone())),
            Arc::new(OllamaProvider::new(http_client)),
        ])
    }

    /// Build a registry from explicit adapter instances.
    pub fn from_providers(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.metadata().name, provider))
            .collect();
        Self { providers }
    }

    /// Look up an adapter. Unknown identifiers are unavailable providers.
    pub fn get(&self, name: ProviderType) -> ProviderResult<Arc<dyn AiProvider>> {
        self.providers
            .get(&name)
            .cloned()
            .ok_or(ProviderError::Unavailable { provider: name })
    }

    pub fn all(&self) -> Vec<Arc<dyn AiProvider>> {
        self.providers.values().cloned().collect()
    }

    /// Aggregate availability and health across all registered adapters.
    ///
    /// Health-check failures are logged and folded into `available: false`;
    /// this method never errors.
    pub async fn available(&self) -> Vec<ProviderInfo> {
        let probes = self.all().into_iter().map(|provider| async move {
            let is_available = provider.is_available();
            let mut health = HealthStatus::unhealthy("Provider is not configured");

            if is_available {
                match provider.health_check().await {
                    Ok(status) => health = status,
                    Err(e) => {
                        warn!(
                            provider = %provider.metadata().name,
                            error = %e,
                            "Health check failed"
                        );
                    }
                }
            }

            ProviderInfo {
                metadata: provider.metadata().clone(),
                models: provider.models(),
                capabilities: provider.capabilities().clone(),
                available: is_available && health.available,
                latency_ms: health.latency_ms,
            }
        });

        join_all(probes).await
    }
}
