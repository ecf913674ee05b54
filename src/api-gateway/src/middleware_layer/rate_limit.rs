//! Rate limiting gate applied in front of all inbound requests
//!
//! Static-asset and internal paths pass through untouched. Everything else
//! is counted against a per-client identifier and either forwarded or
//! rejected with a 429, and always annotated with quota headers. A failing
//! rate limiter never blocks traffic: the gate fails open.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::services::rate_limiter::RateLimitResult;
use crate::state::AppState;
use easyprompt_shared::error_messages;

const STATIC_PREFIX: &str = "/static";
const IMAGE_PREFIX: &str = "/images";
const INTERNAL_API_PREFIX: &str = "/api/internal";
const FAVICON_PATH: &str = "/favicon.ico";

/// File extensions served as assets, never counted against a quota.
const SKIPPED_EXTENSIONS: [&str; 13] = [
    "ico", "png", "jpg", "jpeg", "svg", "webp", "gif", "css", "js", "woff", "woff2", "ttf", "eot",
];

/// Identifier used when no client address header is present.
const FALLBACK_IDENTIFIER: &str = "anonymous";

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if should_skip(request.uri().path()) {
        return next.run(request).await;
    }

    let identifier = derive_identifier(request.headers());

    let result = match state.rate_limiter.check(&identifier).await {
        Ok(result) => result,
        Err(e) => {
            // Fail open: an internal rate-limiter fault must never block
            // traffic. Forward without headers.
            error!(
                error = %e,
                identifier = %identifier,
                "Rate limit check failed, allowing request"
            );
            return next.run(request).await;
        }
    };

    let mut response = if result.allowed {
        next.run(request).await
    } else {
        state
            .metrics
            .record_rate_limit_hit(state.rate_limiter.backend_name());
        warn!(
            identifier = %identifier,
            limit = result.limit,
            "Rate limit exceeded"
        );
        rejection_response(&result)
    };

    annotate_response(response.headers_mut(), &result, &state);
    response
}

/// Static assets and internal paths bypass the gate entirely.
fn should_skip(path: &str) -> bool {
    if path.starts_with(STATIC_PREFIX)
        || path.starts_with(IMAGE_PREFIX)
        || path == FAVICON_PATH
        || path.starts_with(INTERNAL_API_PREFIX)
    {
        return true;
    }

    path.rsplit_once('.')
        .map(|(_, extension)| SKIPPED_EXTENSIONS.contains(&extension))
        .unwrap_or(false)
}

/// Derive the quota identifier from client address headers: first hop of
/// `x-forwarded-for`, then `x-real-ip`, then a shared fallback. Namespaced
/// to keep it out of other key spaces.
fn derive_identifier(headers: &HeaderMap) -> String {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or(FALLBACK_IDENTIFIER);

    format!("ip:{}", ip)
}

fn rejection_response(result: &RateLimitResult) -> Response {
    let body = serde_json::json!({
        "error": "Too many requests",
        "message": error_messages::RATE_LIMIT_EXCEEDED,
        "limit": result.limit,
        "remaining": 0,
        "reset": result.reset.to_rfc3339(),
    });

    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

/// Set the quota headers on every evaluated response, allowed or rejected.
fn annotate_response(headers: &mut HeaderMap, result: &RateLimitResult, state: &AppState) {
    set_header(headers, "x-ratelimit-limit", result.limit.to_string());
    set_header(headers, "x-ratelimit-remaining", result.remaining.to_string());
    set_header(headers, "x-ratelimit-reset", result.reset.to_rfc3339());

    if let Some(retry_after) = result.retry_after {
        set_header(headers, "retry-after", retry_after.to_string());
    }

    if state.config.is_development() {
        set_header(
            headers,
            "x-ratelimit-backend",
            state.rate_limiter.backend_name().to_string(),
        );
    }
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_static_and_internal_paths() {
        assert!(should_skip("/static/chunks/main.js"));
        assert!(should_skip("/images/logo"));
        assert!(should_skip("/favicon.ico"));
        assert!(should_skip("/api/internal/build-info"));

        assert!(!should_skip("/v1/prompts/analyze"));
        assert!(!should_skip("/health"));
        assert!(!should_skip("/"));
    }

    #[test]
    fn test_should_skip_asset_extensions() {
        assert!(should_skip("/logo.png"));
        assert!(should_skip("/fonts/inter.woff2"));
        assert!(should_skip("/app.css"));

        assert!(!should_skip("/report.pdf"));
        assert!(!should_skip("/v1/providers"));
    }

    #[test]
    fn test_identifier_prefers_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));

        assert_eq!(derive_identifier(&headers), "ip:192.168.1.1");
    }

    #[test]
    fn test_identifier_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));

        assert_eq!(derive_identifier(&headers), "ip:10.0.0.1");
    }

    #[test]
    fn test_identifier_fallback_without_headers() {
        assert_eq!(derive_identifier(&HeaderMap::new()), "ip:anonymous");
    }
}
