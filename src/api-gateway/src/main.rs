//! EasyPrompt API Gateway
//!
//! HTTP service for prompt analysis and optimization across LLM providers,
//! with centralized rate limiting and observability.

use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use easyprompt_api_gateway::{build_router, AppState, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!(
        "Starting EasyPrompt API Gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    info!(
        "Configuration loaded for environment: {}",
        config.environment
    );

    // Fall back to in-memory rate limiting if the configured backend is
    // unreachable, rather than refusing to start.
    let state = match AppState::new(config.clone()).await {
        Ok(state) => {
            info!("Application state initialized successfully");
            state
        }
        Err(e) => {
            warn!("Failed to initialize full application state: {}", e);
            info!("Starting in degraded mode with in-memory rate limiting");
            AppState::new_degraded(config.clone()).await?
        }
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API Gateway listening on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API Gateway shutdown complete");
    Ok(())
}

/// Initialize structured logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "easyprompt_api_gateway=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            warn!("Received SIGTERM, shutting down gracefully");
        },
    }
}
