//! Anthropic provider adapter

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::error_utils;
use crate::parse::{parse_model_json, AnalysisPayload, OptimizationPayload};
use crate::prompts::{
    optimization_request, ANALYSIS_MAX_TOKENS, ANALYSIS_SYSTEM_PROMPT, OPTIMIZATION_MAX_TOKENS,
    OPTIMIZATION_SYSTEM_PROMPT, PREVIEW_MAX_TOKENS,
};
use crate::provider::AiProvider;
use easyprompt_shared::{
    AnalysisResult, HealthStatus, Model, ModelTier, OptimizedPrompt, ProviderCapabilities,
    ProviderCategory, ProviderLocation, ProviderMetadata, ProviderType,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

pub struct AnthropicProvider {
    metadata: ProviderMetadata,
    capabilities: ProviderCapabilities,
    models: Vec<Model>,
    base_url: String,
    http_client: Client,
}

impl AnthropicProvider {
    pub fn new(http_client: Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            metadata: ProviderMetadata {
                name: ProviderType::Anthropic,
                display_name: "Anthropic".to_string(),
                category: ProviderCategory::Commercial,
                location: ProviderLocation::Remote,
                requires_api_key: true,
                supports_model_discovery: false,
            },
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: true,
                vision: true,
                embeddings: false,
                max_tokens: 8192,
            },
            models: vec![
                Model::new(
                    "claude-3-5-haiku-20241022",
                    "Claude 3.5 Haiku",
                    ModelTier::Fast,
                ),
                Model::new(
                    "claude-3-5-sonnet-20241022",
                    "Claude 3.5 Sonnet",
                    ModelTier::Balanced,
                ),
                Model::new("claude-3-opus-20240229", "Claude 3 Opus", ModelTier::Powerful),
            ],
            base_url: base_url.into(),
            http_client,
        }
    }

    fn api_key(&self) -> ProviderResult<String> {
        std::env::var(self.metadata.name.api_key_env())
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ProviderError::InvalidConfig {
                provider: self.metadata.name,
                message: format!("{} is not set", self.metadata.name.api_key_env()),
            })
    }

    /// Single-turn messages call, returning the first text content block.
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> ProviderResult<String> {
        let provider = self.metadata.name;
        let url = format!("{}/v1/messages", self.base_url);

        let mut request_body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(system) = system {
            request_body["system"] = json!(system);
        }

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", self.api_key()?)
            .header("anthropic-version", API_VERSION)
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

        payload["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Api {
                provider,
                status: None,
                message: "Response carried no text content".to_string(),
            })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn models(&self) -> Vec<Model> {
        self.models.clone()
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
        let raw = self
            .chat(
                Some(ANALYSIS_SYSTEM_PROMPT),
                prompt,
                &model,
                ANALYSIS_MAX_TOKENS,
            )
            .await?;
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
                OPTIMIZATION_MAX_TOKENS,
            )
            .await?;
        let payload: OptimizationPayload = parse_model_json(self.metadata.name, &raw)?;
        Ok(payload.into())
    }

    async fn generate_preview(&self, prompt: &str, model: Option<&str>) -> ProviderResult<String> {
        let model = self.resolve_model(model);
        self.chat(None, prompt, &model, PREVIEW_MAX_TOKENS).await
    }

    async fn health_check(&self) -> ProviderResult<HealthStatus> {
        let start = Instant::now();
        match self.chat(None, "ping", self.default_model(), 1).await {
            Ok(_) => Ok(HealthStatus::healthy(start.elapsed().as_millis() as u64)
                .with_models_count(self.models.len())),
            Err(e) => Ok(HealthStatus::unhealthy(e.to_string())),
        }
    }
}
