//! Request logging and instrumentation middleware

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::state::AppState;

/// Logs every request with a per-request span and records HTTP metrics.
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4().to_string();

    // Matched path groups metrics by route template instead of raw URI.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str())
        .unwrap_or_else(|| uri.path())
        .to_string();

    let client_ip = extract_client_ip(&request);

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        client_ip = %client_ip,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if state.config.observability.metrics_enabled {
        state
            .metrics
            .record_http_request(method.as_str(), &path, status.as_u16(), duration);
    }

    match status {
        status if status.is_server_error() => {
            error!(
                method = %method,
                path = %path,
                status = %status,
                duration_ms = duration.as_millis(),
                client_ip = %client_ip,
                "Request completed with server error"
            );
        }
        status if status.is_client_error() => {
            warn!(
                method = %method,
                path = %path,
                status = %status,
                duration_ms = duration.as_millis(),
                client_ip = %client_ip,
                "Request completed with client error"
            );
        }
        _ => {
            info!(
                method = %method,
                path = %path,
                status = %status,
                duration_ms = duration.as_millis(),
                "Request completed"
            );
        }
    }

    response
}

/// Extract client IP from proxy headers, falling back to "unknown".
fn extract_client_ip(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return first_ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    "unknown".to_string()
}
