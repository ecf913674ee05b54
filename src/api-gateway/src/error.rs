//! Error handling for the gateway
//!
//! Provider errors map into HTTP status codes here; handlers log the
//! original cause before surfacing, so responses carry the normalized
//! message only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use easyprompt_providers::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Standardized error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            service: service.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Provider(provider_error) => match provider_error {
                ProviderError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ProviderError::Authentication { .. } => StatusCode::BAD_GATEWAY,
                ProviderError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
                ProviderError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
                ProviderError::Api { .. } => StatusCode::BAD_GATEWAY,
                ProviderError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Json(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_)
            | ApiError::Redis(_)
            | ApiError::Io(_)
            | ApiError::Generic(_)
            | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::HttpClient(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get the error type string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found_error",
            ApiError::RateLimit { .. } => "rate_limit_error",
            ApiError::ServiceUnavailable { .. } => "service_unavailable_error",
            ApiError::Provider(provider_error) => match provider_error {
                ProviderError::Unavailable { .. } => "provider_unavailable_error",
                ProviderError::Authentication { .. } => "provider_authentication_error",
                ProviderError::RateLimit { .. } => "provider_rate_limit_error",
                ProviderError::ModelNotFound { .. } => "model_not_found_error",
                ProviderError::Api { .. } => "provider_api_error",
                ProviderError::InvalidConfig { .. } => "provider_config_error",
            },
            ApiError::Config(_) => "configuration_error",
            ApiError::Redis(_) => "cache_error",
            ApiError::HttpClient(_) => "http_client_error",
            ApiError::Json(_) => "json_error",
            ApiError::Io(_) => "io_error",
            ApiError::Generic(_) => "generic_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Check if this error should be logged as a server error
    pub fn should_log(&self) -> bool {
        match self {
            // Client-class errors: surfaced, not error-logged.
            ApiError::Validation { .. }
            | ApiError::NotFound { .. }
            | ApiError::RateLimit { .. } => false,

            ApiError::Provider(provider_error) => !matches!(
                provider_error,
                ProviderError::RateLimit { .. } | ProviderError::ModelNotFound { .. }
            ),

            _ => true,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_type = self.error_type();
        let message = self.to_string();

        if self.should_log() {
            error!(
                error = %self,
                status_code = %status_code,
                error_type = error_type,
                "API error occurred"
            );
        }

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            request_id: None, // Set by middleware when available
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyprompt_shared::ProviderType;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::validation("prompt", "too short").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("provider").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::rate_limit("limit exceeded").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::service_unavailable("redis").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_provider_error_mapping() {
        let unavailable: ApiError = ProviderError::Unavailable {
            provider: ProviderType::Anthropic,
        }
        .into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.error_type(), "provider_unavailable_error");

        let not_found: ApiError = ProviderError::ModelNotFound {
            provider: ProviderType::Openai,
            model: "gpt-9".to_string(),
        }
        .into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let upstream_limit: ApiError = ProviderError::RateLimit {
            provider: ProviderType::Openai,
            retry_after: None,
        }
        .into();
        assert_eq!(upstream_limit.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_should_log() {
        assert!(!ApiError::validation("field", "message").should_log());
        assert!(!ApiError::rate_limit("limit").should_log());
        assert!(ApiError::internal("server error").should_log());

        let provider_unavailable: ApiError = ProviderError::Unavailable {
            provider: ProviderType::Google,
        }
        .into();
        assert!(provider_unavailable.should_log());
    }
}
