//! OpenAPI specification generation for the Lunexis geolocation API.
//!
//! The document is served at `/api/openapi.json` and written to disk by the
//! `gen-openapi` binary for client generation.

use axum::Json;
use lunexis_geo_core::{
    AccuracyTier, Capability, Coordinate, GeocodeResult, GeofenceRegion, LocationUpdate, Place,
    Position,
};
use utoipa::OpenApi;

use super::config::{
    ConfigResponse, GeocodingConfigResponse, ProviderConfigResponse, WatchConfigResponse,
};
use super::error::ErrorResponse;
use super::geocode::ReverseGeocodeResponse;
use super::geofences::{
    EvaluateRequest, EvaluateResponse, GeofenceListResponse, PutGeofenceRequest,
};
use super::health::HealthResponse;
use super::location::WatchStatusResponse;

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> serde_json::Result<String> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lunexis Geolocation API",
        version = "0.1.0",
        description = r#"
# Lunexis Geolocation API

Position tracking, geofencing and geocoding for a single device.

## Overview

1. **Location**: one-shot fixes, the last known position, and a watch loop
   that feeds a Server-Sent Events stream at `/api/location/updates`
2. **Geofences**: circular regions; every position from the watch loop is
   tagged with the regions it falls inside (boundary inclusive)
3. **Geocoding**: address search and reverse lookup. Reverse lookup falls
   back to the formatted coordinates instead of failing.

## Errors

Errors share one JSON shape (`ErrorResponse`). `permission_denied` (403) and
`unsupported` (503) need user action; `position_unavailable`, `timeout` and
`geocoding_request_failed` may succeed on retry.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local Lunexis geolocation server")
    ),
    tags(
        (name = "system", description = "Health checks, service status and configuration"),
        (name = "location", description = "Position fixes and the watch loop"),
        (name = "geofences", description = "Circular region management and evaluation"),
        (name = "geocoding", description = "Address search, reverse lookup and nearby places")
    ),
    paths(
        // Health endpoints
        super::health::health_check,
        // Config endpoints
        super::config::get_config,
        // Location endpoints
        super::location::get_current_position,
        super::location::get_last_position,
        super::location::get_watch_status,
        super::location::start_watch,
        super::location::stop_watch,
        super::location::location_updates,
        // Geofence endpoints
        super::geofences::list_geofences,
        super::geofences::put_geofence,
        super::geofences::delete_geofence,
        super::geofences::clear_geofences,
        super::geofences::evaluate_position,
        // Geocoding endpoints
        super::geocode::reverse_geocode,
        super::geocode::search_address,
        super::places::nearby_places,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Config types
            ConfigResponse,
            ProviderConfigResponse,
            WatchConfigResponse,
            GeocodingConfigResponse,
            // Location types
            Coordinate,
            Position,
            LocationUpdate,
            Capability,
            AccuracyTier,
            WatchStatusResponse,
            // Geofence types
            GeofenceRegion,
            GeofenceListResponse,
            PutGeofenceRequest,
            EvaluateRequest,
            EvaluateResponse,
            // Geocoding types
            GeocodeResult,
            ReverseGeocodeResponse,
            Place,
        )
    )
)]
pub struct ApiDoc;
