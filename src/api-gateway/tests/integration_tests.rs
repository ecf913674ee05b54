//! Integration tests for the EasyPrompt API Gateway
//!
//! These drive the full router through tower's `oneshot`, covering the
//! rate-limit gate end-to-end, request validation, and the provider
//! endpoints that don't need live upstreams.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use easyprompt_api_gateway::{build_router, AppState, Config};

/// Build a memory-backed test app with the given per-window limit.
async fn test_app(max_requests: u32) -> Router {
    let mut config = Config::default();
    config.environment = "test".to_string();
    config.rate_limit.max_requests = max_requests;

    let state = AppState::new(config)
        .await
        .expect("Failed to create test state");
    build_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    client_ip: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, value)
}

#[tokio::test]
async fn test_skip_paths_bypass_the_gate() {
    let app = test_app(2).await;

    // Static-asset paths are never evaluated: no quota headers, no counting.
    for uri in ["/favicon.ico", "/static/chunks/main.js", "/logo.png"] {
        let (_, headers, _) = send(&app, Method::GET, uri, Some("8.8.8.8"), None).await;
        assert!(
            headers.get("x-ratelimit-limit").is_none(),
            "skip path {} must not carry quota headers",
            uri
        );
    }

    // None of those consumed quota: the first evaluated request still sees
    // the full window.
    let (status, headers, _) = send(&app, Method::GET, "/liveness", Some("8.8.8.8"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-ratelimit-remaining"], "1");
}

#[tokio::test]
async fn test_evaluated_responses_carry_quota_headers() {
    let app = test_app(20).await;

    let (status, headers, _) = send(&app, Method::GET, "/liveness", Some("7.7.7.7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-ratelimit-limit"], "20");
    assert_eq!(headers["x-ratelimit-remaining"], "19");

    // Reset header is a well-formed RFC 3339 timestamp.
    let reset = headers["x-ratelimit-reset"].to_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());
}

#[tokio::test]
async fn test_limit_then_reject_end_to_end() {
    let app = test_app(20).await;

    // 20 sequential requests inside one window all succeed, with strictly
    // decreasing remaining quota: 19, 18, ..., 0.
    for expected_remaining in (0..20).rev() {
        let (status, headers, _) =
            send(&app, Method::GET, "/liveness", Some("1.2.3.4"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers["x-ratelimit-remaining"],
            expected_remaining.to_string().as_str()
        );
    }

    // The 21st request in the same window is rejected with the full
    // rejection contract.
    let (status, headers, body) =
        send(&app, Method::GET, "/liveness", Some("1.2.3.4"), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.get("retry-after").is_some());

    assert_eq!(body["error"], "Too many requests");
    assert_eq!(body["limit"], 20);
    assert_eq!(body["remaining"], 0);
    let reset = body["reset"].as_str().expect("reset must be a string");
    assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());

    // A different client is unaffected.
    let (status, _, _) = send(&app, Method::GET, "/liveness", Some("4.3.2.1"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_prompt_validation_rejects_short_prompts() {
    let app = test_app(100).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/v1/prompts/analyze",
        Some("2.2.2.2"),
        Some(json!({"prompt": "Hi", "provider": "ollama"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"]
        .as_str()
        .unwrap_or("")
        .contains("at least 10 characters"));
}

#[tokio::test]
async fn test_unknown_provider_path_is_rejected() {
    let app = test_app(100).await;

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/v1/providers/doesnotexist/health",
        Some("2.2.2.2"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_health_endpoint_never_errors() {
    // Anthropic without a credential reports unavailable instead of failing.
    std::env::remove_var("ANTHROPIC_API_KEY");
    let app = test_app(100).await;

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/v1/providers/anthropic/health",
        Some("2.2.2.2"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let app = test_app(100).await;

    // Generate one counted request first.
    send(&app, Method::GET, "/liveness", Some("3.3.3.3"), None).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/metrics")
        .header("x-forwarded-for", "3.3.3.3")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("http_requests_total"));
}

mod fail_open {
    use super::*;
    use async_trait::async_trait;
    use easyprompt_api_gateway::error::{ApiError, Result as GatewayResult};
    use easyprompt_api_gateway::services::health::HealthService;
    use easyprompt_api_gateway::services::metrics::MetricsService;
    use easyprompt_api_gateway::services::rate_limiter::{
        RateLimiterService, RateLimitResult, RateLimitStore,
    };
    use easyprompt_api_gateway::AppMode;
    use easyprompt_providers::ProviderRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    /// Store whose backend is permanently broken.
    struct FailingStore;

    #[async_trait]
    impl RateLimitStore for FailingStore {
        async fn increment(
            &self,
            _identifier: &str,
            _limit: u32,
            _window: Duration,
        ) -> GatewayResult<RateLimitResult> {
            Err(ApiError::service_unavailable("rate-limit-store"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_gate_fails_open_on_store_errors() {
        let mut config = Config::default();
        config.environment = "test".to_string();

        let http_client = reqwest::Client::new();
        let providers = Arc::new(ProviderRegistry::new(http_client.clone()));
        let rate_limiter = Arc::new(RateLimiterService::new(
            Arc::new(FailingStore),
            config.rate_limit.clone(),
        ));
        let health_service = Arc::new(HealthService::new(None, providers.clone(), "test"));
        let metrics = Arc::new(MetricsService::new().unwrap());

        let state = AppState {
            config,
            mode: AppMode::Full,
            redis_manager: None,
            http_client,
            providers,
            rate_limiter,
            health_service,
            metrics,
        };
        let app = build_router(state);

        // A broken store must not block traffic, and the response carries
        // no quota headers because nothing was evaluated.
        let (status, headers, _) =
            send(&app, Method::GET, "/liveness", Some("9.9.9.9"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get("x-ratelimit-limit").is_none());
    }
}
