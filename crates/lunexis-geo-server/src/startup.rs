//! Wiring from configuration to a running service.

use std::sync::Arc;

use lunexis_geo_core::{
    GeoConfig, GeocodingClient, GeolocationService, LocationProvider, ProviderConfig, ProviderKind,
};
use tracing::{info, warn};

use crate::state::{AppState, SharedState};

/// Build the location provider named by the configuration.
///
/// # Errors
///
/// Returns an error if the provider was not compiled in.
pub fn build_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn LocationProvider>> {
    match config.kind {
        ProviderKind::Gpsd => gpsd_provider(config),
        ProviderKind::Mock => mock_provider(),
    }
}

#[cfg(feature = "gpsd")]
#[allow(clippy::unnecessary_wraps)]
fn gpsd_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn LocationProvider>> {
    info!(host = %config.host, port = config.port, "using gpsd location provider");
    Ok(Arc::new(lunexis_geo_core::GpsdProvider::new(
        &config.host,
        config.port,
    )))
}

#[cfg(not(feature = "gpsd"))]
fn gpsd_provider(_config: &ProviderConfig) -> anyhow::Result<Arc<dyn LocationProvider>> {
    anyhow::bail!("provider.kind = \"gpsd\" but the server was built without the `gpsd` feature")
}

#[cfg(feature = "mock-location")]
#[allow(clippy::unnecessary_wraps)]
fn mock_provider() -> anyhow::Result<Arc<dyn LocationProvider>> {
    warn!("using mock location provider; no real fixes will be produced");
    Ok(Arc::new(lunexis_geo_core::MockLocationProvider::new()))
}

#[cfg(not(feature = "mock-location"))]
fn mock_provider() -> anyhow::Result<Arc<dyn LocationProvider>> {
    anyhow::bail!(
        "provider.kind = \"mock\" but the server was built without the `mock-location` feature"
    )
}

/// Build shared state from configuration, using the configured provider.
///
/// # Errors
///
/// Returns an error if the provider is unavailable in this build or a
/// component rejects its configuration.
pub async fn build_state(config: GeoConfig) -> anyhow::Result<SharedState> {
    let provider = build_provider(&config.provider)?;
    build_state_with_provider(config, provider).await
}

/// Build shared state around an existing provider.
///
/// Loads the configured regions and starts watching if `watch.auto_start`
/// is set. A failed auto-start is logged and the server still comes up.
///
/// # Errors
///
/// Returns an error if a configured region is invalid or the geocoding
/// client cannot be built.
pub async fn build_state_with_provider(
    config: GeoConfig,
    provider: Arc<dyn LocationProvider>,
) -> anyhow::Result<SharedState> {
    let service = Arc::new(
        GeolocationService::initialize(provider, config.watch.to_position_options()).await,
    );

    for region in &config.regions {
        service.add_region(region.clone())?;
    }
    if !config.regions.is_empty() {
        info!(count = config.regions.len(), "loaded geofence regions from config");
    }

    if config.watch.auto_start {
        if let Err(e) = service.start(service.default_options()).await {
            warn!(error = %e, "could not start location watch at start-up");
        }
    }

    let geocoding = GeocodingClient::new(&config.geocoding)?;
    Ok(AppState::new(service, geocoding, config))
}
