//! Parsing of structured JSON replies out of model completions
//!
//! Models are instructed to return bare JSON, but some wrap it in markdown
//! fences or lead with prose anyway. These helpers tolerate that.

use crate::error::{ProviderError, ProviderResult};
use easyprompt_shared::{AnalysisResult, OptimizedPrompt, ProviderType};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Parse a JSON value of type `T` out of a raw model completion.
pub fn parse_model_json<T: DeserializeOwned>(
    provider: ProviderType,
    raw: &str,
) -> ProviderResult<T> {
    let candidate = extract_json(raw);
    serde_json::from_str(candidate).map_err(|e| ProviderError::Api {
        provider,
        status: None,
        message: format!("Model returned malformed JSON: {}", e),
    })
}

/// Strip markdown fences and surrounding prose, keeping the outermost
/// JSON object.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    // Fenced block: take whatever sits between the fences.
    if let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        if let Some(inner) = rest.rsplit_once("```").map(|(inner, _)| inner) {
            return inner.trim();
        }
    }

    // Prose around a bare object: take first '{' through last '}'.
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Wire shape of an analysis reply. The model sometimes echoes a
/// `provider` field; it is ignored in favor of the adapter's own identity.
#[derive(Debug, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub score: u8,
}

impl AnalysisPayload {
    pub fn into_result(self, provider: ProviderType) -> AnalysisResult {
        AnalysisResult {
            issues: self.issues,
            suggestions: self.suggestions,
            score: self.score.min(100),
            provider,
        }
    }
}

/// Wire shape of an optimization reply.
#[derive(Debug, Deserialize)]
pub struct OptimizationPayload {
    pub text: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl From<OptimizationPayload> for OptimizedPrompt {
    fn from(payload: OptimizationPayload) -> Self {
        OptimizedPrompt {
            text: payload.text,
            improvements: payload.improvements,
            reasoning: payload.reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_json() {
        let raw = r#"{"issues":["vague"],"suggestions":["add persona"],"score":70}"#;
        let payload: AnalysisPayload = parse_model_json(ProviderType::Anthropic, raw).unwrap();
        assert_eq!(payload.issues, vec!["vague"]);
        assert_eq!(payload.score, 70);
    }

    #[test]
    fn test_parses_fenced_json() {
        let raw = "```json\n{\"text\":\"better prompt\",\"improvements\":[],\"reasoning\":\"r\"}\n```";
        let payload: OptimizationPayload = parse_model_json(ProviderType::Openai, raw).unwrap();
        assert_eq!(payload.text, "better prompt");
    }

    #[test]
    fn test_parses_json_with_surrounding_prose() {
        let raw = "Here is the analysis:\n{\"issues\":[],\"suggestions\":[],\"score\":90}\nHope it helps!";
        let payload: AnalysisPayload = parse_model_json(ProviderType::Google, raw).unwrap();
        assert_eq!(payload.score, 90);
    }

    #[test]
    fn test_malformed_json_maps_to_api_error() {
        let err = parse_model_json::<AnalysisPayload>(ProviderType::Ollama, "not json at all")
            .unwrap_err();
        match err {
            ProviderError::Api {
                provider, status, ..
            } => {
                assert_eq!(provider, ProviderType::Ollama);
                assert!(status.is_none());
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_score_is_clamped_to_100() {
        let raw = r#"{"issues":[],"suggestions":[],"score":250}"#;
        let payload: AnalysisPayload = parse_model_json(ProviderType::Anthropic, raw).unwrap();
        let result = payload.into_result(ProviderType::Anthropic);
        assert_eq!(result.score, 100);
    }
}
