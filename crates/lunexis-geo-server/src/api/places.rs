//! Nearby places API endpoint.
//!
//! No places provider is integrated, so the endpoint answers 501 after
//! validating its input.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use lunexis_geo_core::{types, Place};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Default search radius in meters.
const DEFAULT_RADIUS_METERS: f64 = 500.0;

/// Creates the places router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/nearby", get(nearby_places))
}

/// Where to look for places.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// Latitude in degrees.
    #[param(example = 37.7749)]
    pub lat: f64,

    /// Longitude in degrees.
    #[param(example = -122.4194)]
    pub lon: f64,

    /// Search radius in meters. Defaults to 500.
    #[param(example = 500.0)]
    pub radius: Option<f64>,
}

/// Points of interest near a coordinate.
#[utoipa::path(
    get,
    path = "/api/places/nearby",
    tag = "geocoding",
    operation_id = "nearbyPlaces",
    summary = "Find places near a coordinate",
    description = "Not integrated with a places provider yet; valid requests \
        return 501 with error `places_not_integrated`.",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Places", body = Vec<Place>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 501, description = "No places provider", body = ErrorResponse)
    )
)]
pub async fn nearby_places(
    State(state): State<SharedState>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<Place>>> {
    if !types::is_valid_latitude(query.lat) || !types::is_valid_longitude(query.lon) {
        return Err(ApiError::bad_request(
            "invalid_coordinate",
            "lat must be within [-90, 90] and lon within [-180, 180]",
        ));
    }
    let radius = query.radius.unwrap_or(DEFAULT_RADIUS_METERS);
    if !(radius.is_finite() && radius > 0.0) {
        return Err(ApiError::bad_request("invalid_radius", "radius must be positive"));
    }

    let places = state
        .geocoding
        .nearby_places(query.lat, query.lon, radius)
        .await?;
    Ok(Json(places))
}
