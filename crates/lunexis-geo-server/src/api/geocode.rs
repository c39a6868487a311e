//! Geocoding API endpoints.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use lunexis_geo_core::{types, GeocodeResult};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the geocode router with all endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/reverse", get(reverse_geocode))
        .route("/search", get(search_address))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Coordinates to label.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReverseQuery {
    /// Latitude in degrees.
    #[param(example = 37.7749, minimum = -90.0, maximum = 90.0)]
    pub lat: f64,

    /// Longitude in degrees.
    #[param(example = -122.4194, minimum = -180.0, maximum = 180.0)]
    pub lon: f64,
}

/// Label for a coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "label": "Civic Center, San Francisco, California, United States"
}))]
pub struct ReverseGeocodeResponse {
    /// A place name, or the coordinates as `"lat, lon"` if lookup failed.
    pub label: String,
}

/// Address to resolve.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-form address.
    #[param(example = "1 Dr Carlton B Goodlett Pl, San Francisco")]
    pub q: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Turn coordinates into a human-readable label.
#[utoipa::path(
    get,
    path = "/api/geocode/reverse",
    tag = "geocoding",
    operation_id = "reverseGeocode",
    summary = "Reverse geocode a coordinate",
    description = "Never fails because of the geocoder: when lookup fails the \
        label is the coordinate pair with six decimals.",
    params(ReverseQuery),
    responses(
        (status = 200, description = "Label", body = ReverseGeocodeResponse),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse)
    )
)]
pub async fn reverse_geocode(
    State(state): State<SharedState>,
    Query(query): Query<ReverseQuery>,
) -> ApiResult<Json<ReverseGeocodeResponse>> {
    if !types::is_valid_latitude(query.lat) || !types::is_valid_longitude(query.lon) {
        return Err(ApiError::bad_request(
            "invalid_coordinate",
            "lat must be within [-90, 90] and lon within [-180, 180]",
        ));
    }

    let label = state.geocoding.reverse_geocode(query.lat, query.lon).await;
    Ok(Json(ReverseGeocodeResponse { label }))
}

/// Resolve an address to coordinates.
#[utoipa::path(
    get,
    path = "/api/geocode/search",
    tag = "geocoding",
    operation_id = "searchAddress",
    summary = "Geocode an address",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best match", body = GeocodeResult),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 404, description = "No match", body = ErrorResponse),
        (status = 502, description = "Geocoder failed", body = ErrorResponse)
    )
)]
pub async fn search_address(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<GeocodeResult>> {
    let address = query.q.trim();
    if address.is_empty() {
        return Err(ApiError::bad_request("empty_query", "q must not be empty"));
    }

    state
        .geocoding
        .geocode(address)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no_match", format!("No match for '{address}'")))
}
