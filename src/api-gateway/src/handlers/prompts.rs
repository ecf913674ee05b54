//! Prompt action handlers: analyze, optimize, preview, compare
//!
//! Each handler validates input, delegates to the selected provider through
//! the registry, logs the original failure cause, and surfaces a normalized
//! error. The comparison handler fans out to all requested providers
//! concurrently and tolerates partial failure.

use std::time::Instant;

use axum::{extract::State, Json};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use validator::Validate;

use crate::error::Result;
use crate::state::AppState;
use easyprompt_providers::ProviderRegistry;
use easyprompt_shared::{AnalysisResult, ComparisonResult, OptimizationResult, ProviderType};

use super::{validate_prompt_length, validate_request};

/// Analyze request
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    #[validate(custom = "validate_prompt_length")]
    pub prompt: String,
    pub provider: ProviderType,
    pub model: Option<String>,
}

/// Optimize request
#[derive(Debug, Deserialize, Validate)]
pub struct OptimizeRequest {
    #[validate(custom = "validate_prompt_length")]
    pub prompt: String,
    pub analysis: AnalysisResult,
    pub provider: ProviderType,
    pub model: Option<String>,
}

/// Preview request
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(custom = "validate_prompt_length")]
    pub prompt: String,
    pub provider: ProviderType,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub output: String,
}

/// One provider entry in a comparison request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub name: ProviderType,
    pub model: Option<String>,
}

/// Compare request. A prior analysis is optional; when present it seeds
/// every provider's rewrite.
#[derive(Debug, Deserialize, Validate)]
pub struct CompareRequest {
    #[validate(custom = "validate_prompt_length")]
    pub prompt: String,
    #[validate(length(min = 1, message = "At least one provider is required"))]
    pub providers: Vec<ProviderSelection>,
    pub analysis: Option<AnalysisResult>,
}

/// Analyze a prompt with the selected provider.
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>> {
    validate_request(&payload)?;

    let provider = state.providers.get(payload.provider)?;
    state
        .metrics
        .record_provider_request(payload.provider.as_str(), "analyze");

    match provider
        .analyze_prompt(&payload.prompt, payload.model.as_deref())
        .await
    {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            state
                .metrics
                .record_provider_error(payload.provider.as_str(), e.code());
            error!(provider = %payload.provider, error = %e, "Analysis failed");
            Err(e.into())
        }
    }
}

/// Optimize a prompt based on a prior analysis.
pub async fn optimize(
    State(state): State<AppState>,
    Json(payload): Json<OptimizeRequest>,
) -> Result<Json<OptimizationResult>> {
    validate_request(&payload)?;

    let provider = state.providers.get(payload.provider)?;
    state
        .metrics
        .record_provider_request(payload.provider.as_str(), "optimize");
    let model = provider.resolve_model(payload.model.as_deref());

    match provider
        .optimize_prompt(&payload.prompt, &payload.analysis, payload.model.as_deref())
        .await
    {
        Ok(optimized) => Ok(Json(OptimizationResult {
            original: payload.prompt,
            optimized: optimized.text,
            improvements: optimized.improvements,
            analysis: Some(payload.analysis),
            provider: payload.provider,
            model,
            timestamp: Utc::now(),
        })),
        Err(e) => {
            state
                .metrics
                .record_provider_error(payload.provider.as_str(), e.code());
            error!(provider = %payload.provider, error = %e, "Optimization failed");
            Err(e.into())
        }
    }
}

/// Generate a raw preview completion for the prompt.
pub async fn preview(
    State(state): State<AppState>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>> {
    validate_request(&payload)?;

    let provider = state.providers.get(payload.provider)?;
    state
        .metrics
        .record_provider_request(payload.provider.as_str(), "preview");

    match provider
        .generate_preview(&payload.prompt, payload.model.as_deref())
        .await
    {
        Ok(output) => Ok(Json(PreviewResponse { output })),
        Err(e) => {
            state
                .metrics
                .record_provider_error(payload.provider.as_str(), e.code());
            error!(provider = %payload.provider, error = %e, "Preview generation failed");
            Err(e.into())
        }
    }
}

/// Optimize the prompt with several providers side by side.
pub async fn compare(
    State(state): State<AppState>,
    Json(payload): Json<CompareRequest>,
) -> Result<Json<Vec<ComparisonResult>>> {
    validate_request(&payload)?;

    for selection in &payload.providers {
        state
            .metrics
            .record_provider_request(selection.name.as_str(), "compare");
    }

    let results = run_comparison(
        &state.providers,
        &payload.prompt,
        payload.analysis.as_ref(),
        &payload.providers,
    )
    .await;
    Ok(Json(results))
}

/// Fan out optimize calls to every selected provider concurrently.
///
/// Each arm settles on its own: a failing provider contributes an error
/// entry instead of aborting the batch, so the result always has exactly
/// one entry per requested provider. Entries follow the requested order,
/// not completion order.
pub(crate) async fn run_comparison(
    registry: &ProviderRegistry,
    prompt: &str,
    analysis: Option<&AnalysisResult>,
    selections: &[ProviderSelection],
) -> Vec<ComparisonResult> {
    let arms = selections.iter().map(|selection| async move {
        let start = Instant::now();

        let provider = match registry.get(selection.name) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(provider = %selection.name, error = %e, "Comparison skipped provider");
                return ComparisonResult {
                    provider: selection.name,
                    model: selection.model.clone().unwrap_or_else(|| "unknown".to_string()),
                    result: None,
                    error: Some(e.to_string()),
                    latency_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        let model = provider.resolve_model(selection.model.as_deref());
        let arm_analysis = analysis.cloned().unwrap_or_else(|| AnalysisResult {
            issues: Vec::new(),
            suggestions: Vec::new(),
            score: 0,
            provider: selection.name,
        });

        match provider
            .optimize_prompt(prompt, &arm_analysis, selection.model.as_deref())
            .await
        {
            Ok(optimized) => ComparisonResult {
                provider: selection.name,
                model: model.clone(),
                result: Some(OptimizationResult {
                    original: prompt.to_string(),
                    optimized: optimized.text,
                    improvements: optimized.improvements,
                    analysis: analysis.cloned(),
                    provider: selection.name,
                    model,
                    timestamp: Utc::now(),
                }),
                error: None,
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => {
                warn!(provider = %selection.name, error = %e, "Comparison arm failed");
                ComparisonResult {
                    provider: selection.name,
                    model,
                    result: None,
                    error: Some(e.to_string()),
                    latency_ms: start.elapsed().as_millis() as u64,
                }
            }
        }
    });

    join_all(arms).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use easyprompt_providers::{AiProvider, ProviderError, ProviderResult};
    use easyprompt_shared::{
        HealthStatus, Model, ModelTier, OptimizedPrompt, ProviderCapabilities, ProviderCategory,
        ProviderLocation, ProviderMetadata,
    };
    use std::sync::Arc;

    struct FixedProvider {
        metadata: ProviderMetadata,
        capabilities: ProviderCapabilities,
        output: Option<String>,
    }

    impl FixedProvider {
        fn new(name: ProviderType, output: Option<&str>) -> Self {
            Self {
                metadata: ProviderMetadata {
                    name,
                    display_name: name.to_string(),
                    category: ProviderCategory::OpenSource,
                    location: ProviderLocation::Local,
                    requires_api_key: false,
                    supports_model_discovery: false,
                },
                capabilities: ProviderCapabilities {
                    streaming: false,
                    function_calling: false,
                    vision: false,
                    embeddings: false,
                    max_tokens: 1024,
                },
                output: output.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl AiProvider for FixedProvider {
        fn metadata(&self) -> &ProviderMetadata {
            &self.metadata
        }

        fn models(&self) -> Vec<Model> {
            vec![Model::new("fixed-1", "Fixed 1", ModelTier::Fast)]
        }

        fn default_model(&self) -> &str {
            "fixed-1"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn analyze_prompt(
            &self,
            _prompt: &str,
            _model: Option<&str>,
        ) -> ProviderResult<AnalysisResult> {
            unimplemented!("not used in these tests")
        }

        async fn optimize_prompt(
            &self,
            _prompt: &str,
            _analysis: &AnalysisResult,
            _model: Option<&str>,
        ) -> ProviderResult<OptimizedPrompt> {
            match &self.output {
                Some(output) => Ok(OptimizedPrompt {
                    text: output.clone(),
                    improvements: vec!["rewritten".to_string()],
                    reasoning: String::new(),
                }),
                None => Err(ProviderError::Api {
                    provider: self.metadata.name,
                    status: Some(500),
                    message: "upstream exploded".to_string(),
                }),
            }
        }

        async fn generate_preview(
            &self,
            _prompt: &str,
            _model: Option<&str>,
        ) -> ProviderResult<String> {
            match &self.output {
                Some(output) => Ok(output.clone()),
                None => Err(ProviderError::Api {
                    provider: self.metadata.name,
                    status: Some(500),
                    message: "upstream exploded".to_string(),
                }),
            }
        }

        async fn health_check(&self) -> ProviderResult<HealthStatus> {
            Ok(HealthStatus::healthy(1))
        }
    }

    fn selection(name: ProviderType) -> ProviderSelection {
        ProviderSelection { name, model: None }
    }

    #[tokio::test]
    async fn test_comparison_isolates_failures() {
        let registry = ProviderRegistry::from_providers(vec![
            Arc::new(FixedProvider::new(ProviderType::Anthropic, Some("a"))),
            Arc::new(FixedProvider::new(ProviderType::Openai, None)),
            Arc::new(FixedProvider::new(ProviderType::Ollama, Some("c"))),
        ]);

        let selections = [
            selection(ProviderType::Anthropic),
            selection(ProviderType::Openai),
            selection(ProviderType::Ollama),
        ];
        let results =
            run_comparison(&registry, "compare this prompt please", None, &selections).await;

        // One entry per requested provider, failures included.
        assert_eq!(results.len(), 3);
        let successes: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
        let failures: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
        assert_eq!(successes.len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].provider, ProviderType::Openai);

        // Successful entries are full optimization records.
        let anthropic = results
            .iter()
            .find(|r| r.provider == ProviderType::Anthropic)
            .and_then(|r| r.result.as_ref())
            .unwrap();
        assert_eq!(anthropic.original, "compare this prompt please");
        assert_eq!(anthropic.optimized, "a");
    }

    #[tokio::test]
    async fn test_comparison_reports_unregistered_providers() {
        let registry = ProviderRegistry::from_providers(vec![Arc::new(FixedProvider::new(
            ProviderType::Ollama,
            Some("ok"),
        ))]);

        let selections = [
            selection(ProviderType::Ollama),
            selection(ProviderType::Google),
        ];
        let results =
            run_comparison(&registry, "compare this prompt too", None, &selections).await;

        assert_eq!(results.len(), 2);
        let google = results
            .iter()
            .find(|r| r.provider == ProviderType::Google)
            .unwrap();
        assert!(google.result.is_none());
        assert!(google.error.as_deref().unwrap_or("").contains("unavailable"));
    }

    #[tokio::test]
    async fn test_comparison_keyed_by_provider_not_completion_order() {
        let registry = ProviderRegistry::from_providers(vec![
            Arc::new(FixedProvider::new(ProviderType::Anthropic, Some("first"))),
            Arc::new(FixedProvider::new(ProviderType::Google, Some("second"))),
        ]);

        let selections = [
            selection(ProviderType::Google),
            selection(ProviderType::Anthropic),
        ];
        let results =
            run_comparison(&registry, "ordering test prompt here", None, &selections).await;

        // Results follow the requested order.
        assert_eq!(results[0].provider, ProviderType::Google);
        assert_eq!(
            results[0].result.as_ref().map(|r| r.optimized.as_str()),
            Some("second")
        );
        assert_eq!(results[1].provider, ProviderType::Anthropic);
    }
}
