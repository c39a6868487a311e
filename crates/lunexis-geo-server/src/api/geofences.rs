//! Geofence API endpoints.
//!
//! Regions are circles identified by a caller-chosen id. Putting a region with
//! an existing id replaces it in place, keeping its position in the list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use lunexis_geo_core::{proximity, types, GeofenceRegion, Position};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the geofences router with all endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_geofences).delete(clear_geofences))
        .route("/evaluate", post(evaluate_position))
        .route("/{id}", put(put_geofence).delete(delete_geofence))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registered regions in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeofenceListResponse {
    /// The regions.
    pub regions: Vec<GeofenceRegion>,
}

/// Body for creating or replacing a region.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "latitude": 37.7749,
    "longitude": -122.4194,
    "radius": 100.0,
    "name": "Home"
}))]
pub struct PutGeofenceRequest {
    /// Center latitude in degrees.
    #[schema(minimum = -90.0, maximum = 90.0)]
    pub latitude: f64,

    /// Center longitude in degrees.
    #[schema(minimum = -180.0, maximum = 180.0)]
    pub longitude: f64,

    /// Radius in meters. Must be positive.
    pub radius: f64,

    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A position to test against the registry.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({ "latitude": 37.7750, "longitude": -122.4195 }))]
pub struct EvaluateRequest {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Accuracy in meters to record on the evaluated position.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Result of evaluating a position.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluateResponse {
    /// Regions containing the position, in registry order.
    pub triggered: Vec<GeofenceRegion>,

    /// How many regions were checked.
    #[schema(example = 3)]
    pub evaluated: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// List all regions.
#[utoipa::path(
    get,
    path = "/api/geofences",
    tag = "geofences",
    operation_id = "listGeofences",
    summary = "List geofence regions",
    responses(
        (status = 200, description = "Regions in insertion order", body = GeofenceListResponse)
    )
)]
pub async fn list_geofences(State(state): State<SharedState>) -> Json<GeofenceListResponse> {
    Json(GeofenceListResponse {
        regions: state.service.list_regions(),
    })
}

/// Create or replace a region.
#[utoipa::path(
    put,
    path = "/api/geofences/{id}",
    tag = "geofences",
    operation_id = "putGeofence",
    summary = "Create or replace a geofence region",
    description = "Ids are any non-empty string of up to 256 characters, \
        percent-encoded in the path. Replacing keeps the region's position in the list.",
    params(("id" = String, Path, description = "Region id", example = "home")),
    request_body = PutGeofenceRequest,
    responses(
        (status = 201, description = "Region created", body = GeofenceRegion),
        (status = 200, description = "Region replaced", body = GeofenceRegion),
        (status = 400, description = "Invalid region", body = ErrorResponse)
    )
)]
pub async fn put_geofence(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<PutGeofenceRequest>,
) -> ApiResult<(StatusCode, Json<GeofenceRegion>)> {
    let mut region = GeofenceRegion::new(id, request.latitude, request.longitude, request.radius);
    region.name = request.name;

    let replaced = state.service.add_region(region.clone())?;
    let status = if replaced.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(region)))
}

/// Remove one region.
#[utoipa::path(
    delete,
    path = "/api/geofences/{id}",
    tag = "geofences",
    operation_id = "deleteGeofence",
    summary = "Delete a geofence region",
    params(("id" = String, Path, description = "Region id", example = "home")),
    responses(
        (status = 204, description = "Region removed"),
        (status = 404, description = "No region with that id", body = ErrorResponse)
    )
)]
pub async fn delete_geofence(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    match state.service.remove_region(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::not_found(
            "region_not_found",
            format!("No geofence region with id '{id}'"),
        )),
    }
}

/// Remove every region.
#[utoipa::path(
    delete,
    path = "/api/geofences",
    tag = "geofences",
    operation_id = "clearGeofences",
    summary = "Delete all geofence regions",
    responses(
        (status = 204, description = "Registry emptied")
    )
)]
pub async fn clear_geofences(State(state): State<SharedState>) -> StatusCode {
    state.service.clear_regions();
    StatusCode::NO_CONTENT
}

/// Evaluate an arbitrary position against the registry.
#[utoipa::path(
    post,
    path = "/api/geofences/evaluate",
    tag = "geofences",
    operation_id = "evaluateGeofences",
    summary = "Check which regions contain a position",
    description = "Pure evaluation. Subscribers are not notified and the last \
        known position is not changed. Boundaries are inclusive.",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Evaluation result", body = EvaluateResponse),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse)
    )
)]
pub async fn evaluate_position(
    State(state): State<SharedState>,
    Json(request): Json<EvaluateRequest>,
) -> ApiResult<Json<EvaluateResponse>> {
    if !types::is_valid_latitude(request.latitude) || !types::is_valid_longitude(request.longitude)
    {
        return Err(ApiError::bad_request(
            "invalid_coordinate",
            "latitude must be within [-90, 90] and longitude within [-180, 180]",
        ));
    }

    let position = Position {
        latitude: request.latitude,
        longitude: request.longitude,
        accuracy: request.accuracy.unwrap_or(0.0),
        altitude: None,
        heading: None,
        speed: None,
        timestamp: Utc::now(),
    };

    // One snapshot so `triggered` is always a subset of what was evaluated.
    let regions = state.service.list_regions();
    Ok(Json(EvaluateResponse {
        triggered: proximity::evaluate(&position, &regions),
        evaluated: regions.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_request_name_is_optional() {
        let request: PutGeofenceRequest =
            serde_json::from_str(r#"{"latitude": 1.0, "longitude": 2.0, "radius": 50.0}"#)
                .unwrap();
        assert!(request.name.is_none());
    }

    #[test]
    fn test_evaluate_request_accuracy_is_optional() {
        let request: EvaluateRequest =
            serde_json::from_str(r#"{"latitude": 1.0, "longitude": 2.0}"#).unwrap();
        assert!(request.accuracy.is_none());
    }
}
