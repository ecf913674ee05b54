//! OpenAI provider adapter

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";

pub struct OpenAiProvider {
    metadata: ProviderMetadata,
    capabilities: ProviderCapabilities,
    models: Vec<Model>,
    base_url: String,
    http_client: Client,
}

impl OpenAiProvider {
    pub fn new(http_client: Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            metadata: ProviderMetadata {
                name: ProviderType::Openai,
                display_name: "OpenAI".to_string(),
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
                max_tokens: 16384,
            },
            models: vec![
                Model::new("gpt-4o-mini", "GPT-4o mini", ModelTier::Fast),
                Model::new("gpt-4-turbo", "GPT-4 Turbo", ModelTier::Balanced),
                Model::new("gpt-4o", "GPT-4o", ModelTier::Powerful),
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

    /// Single-turn chat completion, returning the first choice's content.
    async fn chat(
        &self,
        system: Option<&str>,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> ProviderResult<String> {
        let provider = self.metadata.name;
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let request_body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key()?)
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

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Api {
                provider,
                status: None,
                message: "Response carried no message content".to_string(),
            })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
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

    /// Health probe via the models listing, the cheapest authenticated call.
    async fn health_check(&self) -> ProviderResult<HealthStatus> {
        let provider = self.metadata.name;
        let url = format!("{}/v1/models", self.base_url);
        let start = Instant::now();

        let outcome: ProviderResult<usize> = async {
            let response = self
                .http_client
                .get(&url)
                .bearer_auth(self.api_key()?)
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
            Ok(payload["data"].as_array().map(Vec::len).unwrap_or(0))
        }
        .await;

        match outcome {
            Ok(count) => Ok(HealthStatus::healthy(start.elapsed().as_millis() as u64)
                .with_models_count(count)),
            Err(e) => Ok(HealthStatus::unhealthy(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        std::env::set_var("OPENAI_API_KEY", "test-key");
        OpenAiProvider::with_base_url(Client::new(), server.uri())
    }

    #[tokio::test]
    async fn test_optimize_parses_chat_completion() {
        let server = MockServer::start().await;
        let reply = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"text\":\"Act as an expert. Write...\",\"improvements\":[\"added persona\"],\"reasoning\":\"clearer\"}"
                }
            }]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&server)
            .await;

        let analysis = AnalysisResult {
            issues: vec!["vague".to_string()],
            suggestions: vec![],
            score: 40,
            provider: ProviderType::Openai,
        };
        let result = provider(&server)
            .optimize_prompt("write something good", &analysis, None)
            .await
            .unwrap();
        assert_eq!(result.text, "Act as an expert. Write...");
        assert_eq!(result.improvements, vec!["added persona"]);
    }

    #[tokio::test]
    async fn test_health_check_counts_models() {
        let server = MockServer::start().await;
        let reply = json!({"data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}]});
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&server)
            .await;

        let status = provider(&server).health_check().await.unwrap();
        assert!(status.available);
        assert_eq!(status.models_count, Some(2));
    }

    #[tokio::test]
    async fn test_health_check_reports_unreachable_as_unhealthy() {
        std::env::set_var("OPENAI_API_KEY", "test-key");
        // Port 9 (discard) refuses connections.
        let provider = OpenAiProvider::with_base_url(Client::new(), "http://127.0.0.1:9");
        let status = provider.health_check().await.unwrap();
        assert!(!status.available);
        assert!(status.error.is_some());
    }
}
