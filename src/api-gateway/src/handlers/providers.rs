//! Provider listing, health, and model discovery handlers

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::warn;

use crate::error::Result;
use crate::state::AppState;
use easyprompt_shared::{HealthStatus, Model, ProviderInfo, ProviderType};

/// List all providers with live availability and health.
///
/// Aggregation never fails: a broken provider shows up as unavailable.
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.providers.available().await)
}

/// Probe one provider's health.
///
/// Failures fold into an unhealthy status instead of an error response, so
/// the UI can always render the result.
pub async fn provider_health(
    State(state): State<AppState>,
    Path(provider): Path<ProviderType>,
) -> Json<HealthStatus> {
    let status = match state.providers.get(provider) {
        Ok(adapter) => match adapter.health_check().await {
            Ok(status) => status,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Health check failed");
                HealthStatus::unhealthy(e.to_string())
            }
        },
        Err(e) => HealthStatus::unhealthy(e.to_string()),
    };

    Json(status)
}

/// Refresh and return a provider's model list.
///
/// Discovery-capable providers refresh as a side effect of the health
/// probe; the others return their static list. Failures degrade to an
/// empty list.
pub async fn discover_models(
    State(state): State<AppState>,
    Path(provider): Path<ProviderType>,
) -> Result<Json<Vec<Model>>> {
    let adapter = match state.providers.get(provider) {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!(provider = %provider, error = %e, "Model discovery failed");
            return Ok(Json(Vec::new()));
        }
    };

    if adapter.metadata().supports_model_discovery {
        if let Err(e) = adapter.health_check().await {
            warn!(provider = %provider, error = %e, "Model discovery probe failed");
        }
    }

    Ok(Json(adapter.models()))
}
