//! Ollama provider adapter
//!
//! Ollama runs locally, needs no credential, and is the only adapter with
//! model discovery: the health probe refreshes the model list from
//! `/api/tags`.

use std::sync::RwLock;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::error_utils;
use crate::parse::{parse_model_json, AnalysisPayload, OptimizationPayload};
use crate::prompts::{
    optimization_request, ANALYSIS_SYSTEM_PROMPT, OPTIMIZATION_SYSTEM_PROMPT,
};
use crate::provider::AiProvider;
use easyprompt_shared::{
    AnalysisResult, HealthStatus, Model, ModelTier, OptimizedPrompt, ProviderCapabilities,
    ProviderCategory, ProviderLocation, ProviderMetadata, ProviderType,
};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1";

pub struct OllamaProvider {
    metadata: ProviderMetadata,
    capabilities: ProviderCapabilities,
    /// Model list discovered from the local daemon. Empty until the first
    /// successful health probe.
    discovered: RwLock<Vec<Model>>,
    base_url: String,
    http_client: Client,
}

impl OllamaProvider {
    /// Create an adapter pointed at `OLLAMA_BASE_URL`, falling back to the
    /// daemon's default address.
    pub fn new(http_client: Client) -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(http_client, base_url)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            metadata: ProviderMetadata {
                name: ProviderType::Ollama,
                display_name: "Ollama".to_string(),
                category: ProviderCategory::OpenSource,
                location: ProviderLocation::Local,
                requires_api_key: false,
                supports_model_discovery: true,
            },
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: false,
                vision: false,
                embeddings: true,
                max_tokens: 4096,
            },
            discovered: RwLock::new(Vec::new()),
            base_url: base_url.into(),
            http_client,
        }
    }

    /// Single-turn chat call against the local daemon.
    async fn chat(&self, system: Option<&str>, prompt: &str, model: &str) -> ProviderResult<String> {
        let provider = self.metadata.name;
        let url = format!("{}/api/chat", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let request_body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| error_utils::transport_error(provider, e))?;

        if !response.status().is_success() {
            return Err(error_utils::error_from_response(provider, model, response).await);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| error_utils::decode_error(provider, e))?;

        payload["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Api {
                provider,
                status: None,
                message: "Response carried no message content".to_string(),
            })
    }

    /// Fetch `/api/tags` and replace the discovered model list.
    async fn refresh_models(&self) -> ProviderResult<usize> {
        let provider = self.metadata.name;
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| error_utils::transport_error(provider, e))?;

        if !response.status().is_success() {
            return Err(error_utils::error_from_response(provider, "", response).await);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| error_utils::decode_error(provider, e))?;

        let models: Vec<Model> = payload["models"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry["name"].as_str())
                    .map(|name| Model::new(name, name, ModelTier::Balanced))
                    .collect()
            })
            .unwrap_or_default();

        let count = models.len();
        debug!(provider = %provider, models = count, "Refreshed Ollama model list");

        if let Ok(mut guard) = self.discovered.write() {
            *guard = models;
        }
        Ok(count)
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn models(&self) -> Vec<Model> {
        let discovered = self
            .discovered
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        if discovered.is_empty() {
            vec![Model::new(DEFAULT_MODEL, "Llama 3.1", ModelTier::Balanced)]
        } else {
            discovered
        }
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn analyze_prompt(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> ProviderResult<AnalysisResult> {
        let model = self.resolve_model(model);
        let raw = self.chat(Some(ANALYSIS_SYSTEM_PROMPT), prompt, &model).await?;
        let payload: AnalysisPayload = parse_model_json(self.metadata.name, &raw)?;
        Ok(payload.into_result(self.metadata.name))
    }

    async fn optimize_prompt(
        &self,
        prompt: &str,
        analysis: &AnalysisResult,
        model: Option<&str>,
    ) -> ProviderResult<OptimizedPrompt> {
        let model = self.resolve_model(model);
        let raw = self
            .chat(
                Some(OPTIMIZATION_SYSTEM_PROMPT),
                &optimization_request(prompt, analysis),
                &model,
            )
            .await?;
        let payload: OptimizationPayload = parse_model_json(self.metadata.name, &raw)?;
        Ok(payload.into())
    }

    async fn generate_preview(&self, prompt: &str, model: Option<&str>) -> ProviderResult<String> {
        let model = self.resolve_model(model);
        self.chat(None, prompt, &model).await
    }

    /// Probe the daemon and refresh the discovered model list.
    async fn health_check(&self) -> ProviderResult<HealthStatus> {
        let start = Instant::now();
        match self.refresh_models().await {
            Ok(count) => Ok(HealthStatus::healthy(start.elapsed().as_millis() as u64)
                .with_models_count(count)),
            Err(e) => Ok(HealthStatus::unhealthy(e.to_string())),
        }
    }
}
