//! Configuration API endpoint.
//!
//! Read-only view of the configuration the server was started with, after
//! file and environment layers were merged. Changing it requires a restart.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use lunexis_geo_core::{AccuracyTier, GeoConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// Creates the config router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(get_config))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "bind_address": "127.0.0.1:8080",
    "provider": { "kind": "gpsd", "host": "127.0.0.1", "port": 2947 },
    "watch": { "accuracy": "high", "maximum_age_ms": 0, "timeout_ms": 10000, "auto_start": false },
    "geocoding": { "base_url": "https://nominatim.openstreetmap.org/", "timeout_secs": 10 },
    "preloaded_regions": 2
}))]
pub struct ConfigResponse {
    /// Address the API listens on.
    pub bind_address: String,

    /// Location provider settings.
    pub provider: ProviderConfigResponse,

    /// Defaults for position requests and the watch loop.
    pub watch: WatchConfigResponse,

    /// Geocoding endpoint settings.
    pub geocoding: GeocodingConfigResponse,

    /// Regions loaded from the configuration file at start-up.
    #[schema(example = 2)]
    pub preloaded_regions: usize,
}

/// Location provider settings in response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfigResponse {
    /// `gpsd` or `mock`.
    #[schema(example = "gpsd")]
    pub kind: String,

    /// gpsd host. Unused by the mock provider.
    #[schema(example = "127.0.0.1")]
    pub host: String,

    /// gpsd port. Unused by the mock provider.
    #[schema(example = 2947)]
    pub port: u16,
}

/// Watch defaults in response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchConfigResponse {
    /// Requested accuracy tier.
    pub accuracy: AccuracyTier,

    /// Oldest cached fix to accept, in milliseconds.
    #[schema(example = 0)]
    pub maximum_age_ms: u64,

    /// Fix timeout in milliseconds.
    #[schema(example = 10000)]
    pub timeout_ms: u64,

    /// Whether watching starts with the server.
    pub auto_start: bool,
}

/// Geocoding settings in response. The user agent is not exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodingConfigResponse {
    /// Base URL of the Nominatim-compatible API.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl From<&GeoConfig> for ConfigResponse {
    fn from(config: &GeoConfig) -> Self {
        let kind = match config.provider.kind {
            ProviderKind::Gpsd => "gpsd",
            ProviderKind::Mock => "mock",
        };

        Self {
            bind_address: config.server.bind_address.clone(),
            provider: ProviderConfigResponse {
                kind: kind.to_string(),
                host: config.provider.host.clone(),
                port: config.provider.port,
            },
            watch: WatchConfigResponse {
                accuracy: config.watch.accuracy,
                maximum_age_ms: config.watch.maximum_age_ms,
                timeout_ms: config.watch.timeout_ms,
                auto_start: config.watch.auto_start,
            },
            geocoding: GeocodingConfigResponse {
                base_url: config.geocoding.base_url.clone(),
                timeout_secs: config.geocoding.timeout_secs,
            },
            preloaded_regions: config.regions.len(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the effective configuration.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "system",
    operation_id = "getConfig",
    summary = "Get the effective configuration",
    responses(
        (status = 200, description = "Configuration in effect", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(&state.config))
}
