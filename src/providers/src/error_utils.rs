//! Mapping of upstream HTTP failures into the provider error taxonomy

use crate::error::ProviderError;
use easyprompt_shared::ProviderType;

const MAX_ERROR_TEXT_CHARS: usize = 600;

/// Truncate an upstream error body so it can be logged and surfaced
/// without dragging whole payloads along.
pub fn truncate_error_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error response body>".to_string();
    }

    let char_count = trimmed.chars().count();
    if char_count <= MAX_ERROR_TEXT_CHARS {
        return trimmed.to_string();
    }

    let truncated: String = trimmed.chars().take(MAX_ERROR_TEXT_CHARS).collect();
    format!(
        "{}... [truncated {} chars]",
        truncated,
        char_count - MAX_ERROR_TEXT_CHARS
    )
}

/// Build a `ProviderError` from a non-success HTTP response.
pub async fn error_from_response(
    provider: ProviderType,
    model: &str,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => ProviderError::Authentication { provider },
        429 => ProviderError::RateLimit {
            provider,
            retry_after,
        },
        404 => ProviderError::ModelNotFound {
            provider,
            model: model.to_string(),
        },
        code => ProviderError::Api {
            provider,
            status: Some(code),
            message: truncate_error_text(&body),
        },
    }
}

/// Build a `ProviderError` from a transport-level failure. A provider we
/// cannot reach at all is unavailable, not erroring.
pub fn transport_error(provider: ProviderType, err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() {
        ProviderError::Unavailable { provider }
    } else {
        ProviderError::Api {
            provider,
            status: err.status().map(|s| s.as_u16()),
            message: truncate_error_text(&err.to_string()),
        }
    }
}

/// Build a `ProviderError` from a JSON decode failure on a 2xx response.
pub fn decode_error(provider: ProviderType, err: reqwest::Error) -> ProviderError {
    ProviderError::Api {
        provider,
        status: None,
        message: format!("Failed to decode response: {}", err),
    }
}
