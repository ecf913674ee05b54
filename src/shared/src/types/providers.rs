//! Provider domain types
//!
//! These types describe the contract between the gateway and the LLM
//! provider adapters: who the providers are, what models they expose, and
//! the shapes of analysis, optimization, and comparison results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PROVIDER IDENTITY
// ============================================================================

/// Identifier of a supported LLM provider. Used as a map key everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Anthropic,
    Openai,
    Google,
    Ollama,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "anthropic",
            ProviderType::Openai => "openai",
            ProviderType::Google => "google",
            ProviderType::Ollama => "ollama",
        }
    }

    /// Environment variable holding this provider's API credential.
    pub fn api_key_env(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }

    /// All providers the gateway knows about.
    pub fn all() -> [ProviderType; 4] {
        [
            ProviderType::Anthropic,
            ProviderType::Openai,
            ProviderType::Google,
            ProviderType::Ollama,
        ]
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderType::Anthropic),
            "openai" => Ok(ProviderType::Openai),
            "google" => Ok(ProviderType::Google),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Commercial hosted API vs. self-hostable open-source runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderCategory {
    Commercial,
    OpenSource,
}

/// Whether the provider runs on this machine or behind a remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderLocation {
    Local,
    Remote,
}

/// Static description of a provider adapter. Set at construction, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub name: ProviderType,
    pub display_name: String,
    pub category: ProviderCategory,
    pub location: ProviderLocation,
    pub requires_api_key: bool,
    pub supports_model_discovery: bool,
}

// ============================================================================
// MODELS AND CAPABILITIES
// ============================================================================

/// Rough speed/quality tier of a model within its provider's lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Balanced,
    Powerful,
}

/// A model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub tier: ModelTier,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tier: ModelTier) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier,
        }
    }
}

/// Feature flags and limits of a provider adapter. Immutable per adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub function_calling: bool,
    pub vision: bool,
    pub embeddings: bool,
    pub max_tokens: u32,
}

// ============================================================================
// HEALTH
// ============================================================================

/// Result of a single provider health probe. Produced fresh on every probe,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_count: Option<usize>,
}

impl HealthStatus {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            available: true,
            latency_ms: Some(latency_ms),
            error: None,
            models_count: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            available: false,
            latency_ms: None,
            error: Some(error.into()),
            models_count: None,
        }
    }

    pub fn with_models_count(mut self, count: usize) -> Self {
        self.models_count = Some(count);
        self
    }
}

// ============================================================================
// ANALYSIS, OPTIMIZATION, COMPARISON
// ============================================================================

/// Outcome of analyzing a prompt: concrete issues, suggested fixes, and an
/// overall quality score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    /// Quality score, 0-100.
    pub score: u8,
    pub provider: ProviderType,
}

/// Rewritten prompt as returned by a provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedPrompt {
    pub text: String,
    pub improvements: Vec<String>,
    pub reasoning: String,
}

/// Full optimization record returned to the caller. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub original: String,
    pub optimized: String,
    pub improvements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    pub provider: ProviderType,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated provider listing entry: static metadata plus live availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(flatten)]
    pub metadata: ProviderMetadata,
    pub models: Vec<Model>,
    pub capabilities: ProviderCapabilities,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// One provider's outcome in a side-by-side comparison. Either `result` or
/// `error` is set, never both; a failing provider still yields an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub provider: ProviderType,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OptimizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_round_trip() {
        for provider in ProviderType::all() {
            let parsed: ProviderType = provider.as_str().parse().unwrap();
            assert_eq!(parsed, provider);
        }
        assert!("huggingface".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_provider_type_serde_lowercase() {
        let json = serde_json::to_string(&ProviderType::Anthropic).unwrap();
        assert_eq!(json, "\"anthropic\"");

        let parsed: ProviderType = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(parsed, ProviderType::Ollama);
    }

    #[test]
    fn test_api_key_env_naming() {
        assert_eq!(ProviderType::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(ProviderType::Openai.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(ProviderType::Google.api_key_env(), "GOOGLE_API_KEY");
    }

    #[test]
    fn test_health_status_constructors() {
        let healthy = HealthStatus::healthy(250).with_models_count(3);
        assert!(healthy.available);
        assert_eq!(healthy.latency_ms, Some(250));
        assert_eq!(healthy.models_count, Some(3));
        assert!(healthy.error.is_none());

        let unhealthy = HealthStatus::unhealthy("Connection timeout");
        assert!(!unhealthy.available);
        assert_eq!(unhealthy.error.as_deref(), Some("Connection timeout"));
    }

    #[test]
    fn test_provider_info_flattens_metadata() {
        let info = ProviderInfo {
            metadata: ProviderMetadata {
                name: ProviderType::Ollama,
                display_name: "Ollama".to_string(),
                category: ProviderCategory::OpenSource,
                location: ProviderLocation::Local,
                requires_api_key: false,
                supports_model_discovery: true,
            },
            models: vec![Model::new("llama3", "Llama 3", ModelTier::Balanced)],
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: false,
                vision: false,
                embeddings: false,
                max_tokens: 4096,
            },
            available: true,
            latency_ms: Some(12),
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["name"], "ollama");
        assert_eq!(value["category"], "open-source");
        assert_eq!(value["available"], true);
    }
}
