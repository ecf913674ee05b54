//! Prometheus metrics for the gateway

use std::sync::Arc;
use std::time::Duration;

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

use crate::error::{ApiError, Result};

/// Metrics service collecting and exposing gateway metrics
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Rate limiting metrics
    pub rate_limit_hits_total: CounterVec,

    // Provider metrics
    pub provider_requests_total: CounterVec,
    pub provider_errors_total: CounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "path", "status_code"],
        )
        .map_err(|e| ApiError::internal(format!("Failed to create http_requests_total: {}", e)))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(vec![0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["method", "path"],
        )
        .map_err(|e| {
            ApiError::internal(format!(
                "Failed to create http_request_duration_seconds: {}",
                e
            ))
        })?;

        let rate_limit_hits_total = CounterVec::new(
            Opts::new(
                "rate_limit_hits_total",
                "Total number of requests rejected by the rate limiter",
            ),
            &["backend"],
        )
        .map_err(|e| ApiError::internal(format!("Failed to create rate_limit_hits_total: {}", e)))?;

        let provider_requests_total = CounterVec::new(
            Opts::new(
                "provider_requests_total",
                "Total number of LLM provider calls",
            ),
            &["provider", "operation"],
        )
        .map_err(|e| {
            ApiError::internal(format!("Failed to create provider_requests_total: {}", e))
        })?;

        let provider_errors_total = CounterVec::new(
            Opts::new(
                "provider_errors_total",
                "Total number of failed LLM provider calls",
            ),
            &["provider", "code"],
        )
        .map_err(|e| {
            ApiError::internal(format!("Failed to create provider_errors_total: {}", e))
        })?;

        for collector in [
            &http_requests_total,
            &rate_limit_hits_total,
            &provider_requests_total,
            &provider_errors_total,
        ] {
            registry
                .register(Box::new(collector.clone()))
                .map_err(|e| ApiError::internal(format!("Failed to register metric: {}", e)))?;
        }
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .map_err(|e| ApiError::internal(format!("Failed to register metric: {}", e)))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            rate_limit_hits_total,
            provider_requests_total,
            provider_errors_total,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration.as_secs_f64());
    }

    pub fn record_rate_limit_hit(&self, backend: &str) {
        self.rate_limit_hits_total
            .with_label_values(&[backend])
            .inc();
    }

    pub fn record_provider_request(&self, provider: &str, operation: &str) {
        self.provider_requests_total
            .with_label_values(&[provider, operation])
            .inc();
    }

    pub fn record_provider_error(&self, provider: &str, code: &str) {
        self.provider_errors_total
            .with_label_values(&[provider, code])
            .inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        match encoder.encode(&self.registry.gather(), &mut buffer) {
            Ok(()) => String::from_utf8(buffer).unwrap_or_default(),
            Err(_) => "# Failed to encode metrics\n".to_string(),
        }
    }
}
