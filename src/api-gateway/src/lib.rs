//! EasyPrompt API Gateway library
//!
//! Provides the gateway's routing, middleware (rate limiting, logging),
//! configuration, and service wiring around the provider abstraction.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware_layer;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{Config, RateLimitBackend, RateLimitConfig};
pub use error::{ApiError, Result};
pub use state::{AppMode, AppState};

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, request_id::SetRequestIdLayer,
    trace::TraceLayer,
};

/// Build the main application router with all middleware and routes.
///
/// The rate-limit gate wraps every route, including the operational ones;
/// its own skip predicate exempts static assets. The observability stack
/// sits outside the gate so rejected requests are still logged and counted.
pub fn build_router(state: AppState) -> Router {
    let api_routes = routes::api::router();
    let public_routes = routes::public::router();

    Router::new()
        .nest("/v1", api_routes)
        .merge(public_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(
                    tower_http::request_id::MakeRequestUuid,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    middleware_layer::logging::logging_middleware,
                )),
        )
        .with_state(state)
}
