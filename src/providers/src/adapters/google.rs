//! Google (Gemini) provider adapter

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GoogleProvider {
    metadata: ProviderMetadata,
    capabilities: ProviderCapabilities,
    models: Vec<Model>,
    base_url: String,
    http_client: Client,
}

impl GoogleProvider {
    pub fn new(http_client: Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            metadata: ProviderMetadata {
                name: ProviderType::Google,
                display_name: "Google".to_string(),
                category: ProviderCategory::Commercial,
                location: ProviderLocation::Remote,
                requires_api_key: true,
                supports_model_discovery: false,
            },
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: true,
                vision: true,
                embeddings: true,
                max_tokens: 8192,
            },
            models: vec![
                Model::new("gemini-1.5-flash", "Gemini 1.5 Flash", ModelTier::Fast),
                Model::new("gemini-1.5-pro", "Gemini 1.5 Pro", ModelTier::Powerful),
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

    /// Single-turn generateContent call, returning the first candidate's text.
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> ProviderResult<String> {
        let provider = self.metadata.name;
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            model,
            self.api_key()?
        );

        let mut request_body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"maxOutputTokens": max_tokens},
        });
        if let Some(system) = system {
            request_body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

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

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Api {
                provider,
                status: None,
                message: "Response carried no candidate text".to_string(),
            })
    }
}

#[async_trait]
impl AiProvider for GoogleProvider {
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

    /// Health probe via the models listing.
    async fn health_check(&self) -> ProviderResult<HealthStatus> {
        let provider = self.metadata.name;
        let start = Instant::now();

        let outcome: ProviderResult<usize> = async {
            let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key()?);
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
            Ok(payload["models"].as_array().map(Vec::len).unwrap_or(0))
        }
        .await;

        match outcome {
            Ok(count) => Ok(HealthStatus::healthy(start.elapsed().as_millis() as u64)
                .with_models_count(count)),
            Err(e) => Ok(HealthStatus::unhealthy(e.to_string())),
        }
    }
}
