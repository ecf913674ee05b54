//! Provider error taxonomy
//!
//! Every variant carries the provider it originated from and maps to a
//! stable machine-readable code, so callers can branch without string
//! matching.

use easyprompt_shared::ProviderType;
use thiserror::Error;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider '{provider}' is currently unavailable")]
    Unavailable { provider: ProviderType },

    #[error("Invalid API key or authentication failed for '{provider}'")]
    Authentication { provider: ProviderType },

    #[error("Rate limit exceeded for '{provider}'")]
    RateLimit {
        provider: ProviderType,
        /// Seconds to wait before retrying, when the upstream said so.
        retry_after: Option<u64>,
    },

    #[error("Model '{model}' not found for '{provider}'")]
    ModelNotFound {
        provider: ProviderType,
        model: String,
    },

    #[error("{provider} API error{}: {message}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Api {
        provider: ProviderType,
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid configuration for '{provider}': {message}")]
    InvalidConfig {
        provider: ProviderType,
        message: String,
    },
}

impl ProviderError {
    /// The provider this error originated from.
    pub fn provider(&self) -> ProviderType {
        match self {
            ProviderError::Unavailable { provider }
            | ProviderError::Authentication { provider }
            | ProviderError::RateLimit { provider, .. }
            | ProviderError::ModelNotFound { provider, .. }
            | ProviderError::Api { provider, .. }
            | ProviderError::InvalidConfig { provider, .. } => *provider,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::Unavailable { .. } => "PROVIDER_UNAVAILABLE",
            ProviderError::Authentication { .. } => "AUTHENTICATION_FAILED",
            ProviderError::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            ProviderError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            ProviderError::Api { .. } => "API_ERROR",
            ProviderError::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }
}
