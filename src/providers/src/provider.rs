//! The `AiProvider` contract every adapter implements

use crate::error::ProviderResult;
use async_trait::async_trait;
use easyprompt_shared::{
    AnalysisResult, HealthStatus, Model, OptimizedPrompt, ProviderCapabilities, ProviderMetadata,
};

/// Unified contract over heterogeneous LLM provider APIs.
///
/// Adapters own their metadata, model list, and capability flags; the
/// gateway only ever talks to this trait.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn metadata(&self) -> &ProviderMetadata;

    /// Models this provider currently offers. Discovery-capable adapters
    /// refresh this list as a side effect of `health_check`.
    fn models(&self) -> Vec<Model>;

    fn default_model(&self) -> &str;

    fn capabilities(&self) -> &ProviderCapabilities;

    /// Analyze a prompt: identify issues, suggest fixes, score it.
    async fn analyze_prompt(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> ProviderResult<AnalysisResult>;

    /// Rewrite a prompt based on a prior analysis.
    async fn optimize_prompt(
        &self,
        prompt: &str,
        analysis: &AnalysisResult,
        model: Option<&str>,
    ) -> ProviderResult<OptimizedPrompt>;

    /// Run the prompt as-is and return the raw completion, for
    /// side-by-side comparison.
    async fn generate_preview(&self, prompt: &str, model: Option<&str>) -> ProviderResult<String>;

    /// Probe the provider. Discovery-capable adapters also refresh their
    /// model list here.
    async fn health_check(&self) -> ProviderResult<HealthStatus>;

    /// Whether the provider is configured and enabled. True unless the
    /// adapter declares an API key requirement and no credential is set.
    fn is_available(&self) -> bool {
        api_key_available(self.metadata())
    }

    fn model_info(&self, model_id: &str) -> Option<Model> {
        self.models().into_iter().find(|m| m.id == model_id)
    }

    /// Resolve an optional model override to a concrete model id.
    fn resolve_model(&self, model: Option<&str>) -> String {
        model.unwrap_or_else(|| self.default_model()).to_string()
    }
}

/// Default availability rule shared by adapters: a provider that requires
/// an API key is available iff `<PROVIDER>_API_KEY` is set and non-empty.
pub fn api_key_available(metadata: &ProviderMetadata) -> bool {
    if !metadata.requires_api_key {
        return true;
    }
    std::env::var(metadata.name.api_key_env())
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyprompt_shared::{ProviderCategory, ProviderLocation, ProviderType};

    fn metadata(requires_api_key: bool) -> ProviderMetadata {
        ProviderMetadata {
            name: ProviderType::Ollama,
            display_name: "Ollama".to_string(),
            category: ProviderCategory::OpenSource,
            location: ProviderLocation::Local,
            requires_api_key,
            supports_model_discovery: true,
        }
    }

    #[test]
    fn test_keyless_provider_is_always_available() {
        assert!(api_key_available(&metadata(false)));
    }

    #[test]
    fn test_key_requiring_provider_checks_environment() {
        // OLLAMA_API_KEY is not expected to be set in the test environment.
        std::env::remove_var("OLLAMA_API_KEY");
        assert!(!api_key_available(&metadata(true)));

        std::env::set_var("OLLAMA_API_KEY", "test-key");
        assert!(api_key_available(&metadata(true)));
        std::env::remove_var("OLLAMA_API_KEY");
    }
}
