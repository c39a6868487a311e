//! Application state shared across handlers.

use std::sync::Arc;

use lunexis_geo_core::{GeoConfig, GeocodingClient, GeolocationService, PositionOptions};

/// State handed to every handler.
pub type SharedState = Arc<AppState>;

/// Shared application state.
///
/// The service is internally synchronized, so handlers never take a lock here.
#[derive(Debug)]
pub struct AppState {
    /// The geolocation service.
    pub service: Arc<GeolocationService>,

    /// Geocoding client.
    pub geocoding: GeocodingClient,

    /// Configuration the server was started with.
    pub config: GeoConfig,
}

impl AppState {
    /// Bundle already-built components into shared state.
    #[must_use]
    pub fn new(
        service: Arc<GeolocationService>,
        geocoding: GeocodingClient,
        config: GeoConfig,
    ) -> SharedState {
        Arc::new(Self {
            service,
            geocoding,
            config,
        })
    }

    /// Position options for requests that don't override anything.
    #[must_use]
    pub fn default_options(&self) -> PositionOptions {
        self.service.default_options()
    }
}
