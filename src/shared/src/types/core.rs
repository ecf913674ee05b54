//! Core service types shared across the gateway
//!
//! Per-component health rows for the `/health` endpoint and the system
//! information payload served at `/info`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse health state of one gateway component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health of a single component (rate-limit backend, one provider, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub name: String,
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Static system information served at `/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub platform_name: String,
    pub version: String,
    pub environment: String,
    pub api_version: String,
    pub features: Vec<String>,
}
