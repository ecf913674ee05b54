//! Versioned API routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

/// Create API routes router
pub fn router() -> Router<AppState> {
    Router::new()
        // Prompt actions
        .route("/prompts/analyze", post(handlers::prompts::analyze))
        .route("/prompts/optimize", post(handlers::prompts::optimize))
        .route("/prompts/preview", post(handlers::prompts::preview))
        .route("/prompts/compare", post(handlers::prompts::compare))
        // Provider catalog
        .route("/providers", get(handlers::providers::list_providers))
        .route(
            "/providers/:provider/health",
            get(handlers::providers::provider_health),
        )
        .route(
            "/providers/:provider/models/discover",
            post(handlers::providers::discover_models),
        )
}
