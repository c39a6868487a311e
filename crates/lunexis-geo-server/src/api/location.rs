//! Position API endpoints.
//!
//! One-shot fixes, the last known position, the watch lifecycle, and a
//! Server-Sent Events feed of location updates.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use lunexis_geo_core::{
    AccuracyTier, Capability, GeolocationService, LocationUpdate, Position, PositionOptions,
    SubscriptionId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Updates buffered per SSE client before new ones are dropped.
const SSE_BUFFER: usize = 32;

/// Creates the location router with all endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/current", get(get_current_position))
        .route("/last", get(get_last_position))
        .route("/watch", get(get_watch_status))
        .route("/watch/start", post(start_watch))
        .route("/watch/stop", post(stop_watch))
        .route("/updates", get(location_updates))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Optional overrides for the configured position options.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PositionQuery {
    /// Accuracy tier: `high`, `balanced` or `low`.
    pub accuracy: Option<AccuracyTier>,

    /// Oldest cached fix to accept, in milliseconds.
    #[param(example = 5000)]
    pub maximum_age_ms: Option<u64>,

    /// How long to wait for a fix, in milliseconds. Must be positive.
    #[param(example = 10000, minimum = 1)]
    pub timeout_ms: Option<u64>,
}

impl PositionQuery {
    fn resolve(&self, defaults: PositionOptions) -> ApiResult<PositionOptions> {
        if self.timeout_ms == Some(0) {
            return Err(ApiError::bad_request(
                "invalid_timeout",
                "timeout_ms must be greater than 0",
            ));
        }
        Ok(PositionOptions {
            accuracy: self.accuracy.unwrap_or(defaults.accuracy),
            maximum_age: self
                .maximum_age_ms
                .map_or(defaults.maximum_age, Duration::from_millis),
            timeout: self.timeout_ms.map_or(defaults.timeout, Duration::from_millis),
        })
    }
}

/// Watch state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "running": true,
    "provider": "gpsd",
    "capability": { "status": "available", "permission_query": false },
    "subscribers": 2
}))]
pub struct WatchStatusResponse {
    /// Whether continuous watching is active.
    #[schema(example = true)]
    pub running: bool,

    /// Location provider name.
    #[schema(example = "gpsd")]
    pub provider: String,

    /// Capability detected at start-up.
    pub capability: Capability,

    /// Number of registered update subscribers.
    #[schema(example = 2)]
    pub subscribers: usize,
}

async fn watch_status(service: &GeolocationService) -> WatchStatusResponse {
    WatchStatusResponse {
        running: service.is_running().await,
        provider: service.provider_name().to_string(),
        capability: service.capability(),
        subscribers: service.subscriber_count(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Request a single position fix.
#[utoipa::path(
    get,
    path = "/api/location/current",
    tag = "location",
    operation_id = "getCurrentPosition",
    summary = "Get the current position",
    description = "Asks the location provider for one fix. Subscribers are not \
        notified, but the fix becomes the last known position.",
    params(PositionQuery),
    responses(
        (status = 200, description = "Position acquired", body = Position),
        (status = 400, description = "Invalid options", body = ErrorResponse),
        (status = 403, description = "Location permission denied", body = ErrorResponse),
        (status = 503, description = "No location source or no fix", body = ErrorResponse),
        (status = 504, description = "No fix within the timeout", body = ErrorResponse)
    )
)]
pub async fn get_current_position(
    State(state): State<SharedState>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<Position>> {
    let options = query.resolve(state.default_options())?;
    let position = state.service.get_current_position(options).await?;
    Ok(Json(position))
}

/// Most recent accepted position.
#[utoipa::path(
    get,
    path = "/api/location/last",
    tag = "location",
    operation_id = "getLastPosition",
    summary = "Get the last known position",
    description = "Returns the most recent position from the watch loop or a \
        one-shot request, without touching the provider.",
    responses(
        (status = 200, description = "Last known position", body = Position),
        (status = 404, description = "No position received yet", body = ErrorResponse)
    )
)]
pub async fn get_last_position(State(state): State<SharedState>) -> ApiResult<Json<Position>> {
    state
        .service
        .last_position()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no_position", "No position has been received yet"))
}

/// Watch state.
#[utoipa::path(
    get,
    path = "/api/location/watch",
    tag = "location",
    operation_id = "getWatchStatus",
    summary = "Get watch status",
    responses(
        (status = 200, description = "Watch status", body = WatchStatusResponse)
    )
)]
pub async fn get_watch_status(State(state): State<SharedState>) -> Json<WatchStatusResponse> {
    Json(watch_status(&state.service).await)
}

/// Start continuous watching.
#[utoipa::path(
    post,
    path = "/api/location/watch/start",
    tag = "location",
    operation_id = "startWatch",
    summary = "Start watching position",
    description = "Starts delivering positions to subscribers and evaluating \
        geofences. Calling it while already watching changes nothing.",
    params(PositionQuery),
    responses(
        (status = 200, description = "Watching", body = WatchStatusResponse),
        (status = 400, description = "Invalid options", body = ErrorResponse),
        (status = 403, description = "Location permission denied", body = ErrorResponse),
        (status = 503, description = "No location source", body = ErrorResponse)
    )
)]
pub async fn start_watch(
    State(state): State<SharedState>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<WatchStatusResponse>> {
    let options = query.resolve(state.default_options())?;
    state.service.start(options).await?;
    Ok(Json(watch_status(&state.service).await))
}

/// Stop continuous watching.
#[utoipa::path(
    post,
    path = "/api/location/watch/stop",
    tag = "location",
    operation_id = "stopWatch",
    summary = "Stop watching position",
    description = "Cancels the platform subscription. Safe to call when not watching.",
    responses(
        (status = 200, description = "Stopped", body = WatchStatusResponse)
    )
)]
pub async fn stop_watch(State(state): State<SharedState>) -> Json<WatchStatusResponse> {
    state.service.stop().await;
    Json(watch_status(&state.service).await)
}

/// Removes the subscription when the SSE stream is dropped.
struct SubscriptionGuard {
    service: Arc<GeolocationService>,
    id: SubscriptionId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if self.service.unsubscribe(self.id) {
            debug!(subscription = %self.id, "SSE client disconnected");
        }
    }
}

/// Stream location updates as Server-Sent Events.
#[utoipa::path(
    get,
    path = "/api/location/updates",
    tag = "location",
    operation_id = "streamLocationUpdates",
    summary = "Stream location updates",
    description = "Server-Sent Events stream. Each `location` event carries a \
        LocationUpdate with the position and the geofences it falls inside. \
        Events only flow while watching is started.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = LocationUpdate)
    )
)]
pub async fn location_updates(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<LocationUpdate>(SSE_BUFFER);
    let id = state.service.subscribe(move |update: &LocationUpdate| {
        tx.try_send(update.clone())
            .map_err(|e| anyhow::anyhow!("SSE client not keeping up: {e}"))
    });
    let guard = SubscriptionGuard {
        service: Arc::clone(&state.service),
        id,
    };

    let updates = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let update = rx.recv().await?;
        Some((update, (rx, guard)))
    });
    let events = updates.filter_map(|update| async move {
        match Event::default().event("location").json_data(&update) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode location update");
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_overrides_defaults() {
        let query = PositionQuery {
            accuracy: Some(AccuracyTier::Low),
            maximum_age_ms: Some(2_000),
            timeout_ms: None,
        };
        let options = query.resolve(PositionOptions::default()).unwrap();
        assert_eq!(options.accuracy, AccuracyTier::Low);
        assert_eq!(options.maximum_age, Duration::from_secs(2));
        assert_eq!(options.timeout, PositionOptions::default().timeout);
    }

    #[test]
    fn test_empty_query_keeps_defaults() {
        let defaults = PositionOptions {
            accuracy: AccuracyTier::Balanced,
            maximum_age: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(PositionQuery::default().resolve(defaults).unwrap(), defaults);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let query = PositionQuery {
            timeout_ms: Some(0),
            ..PositionQuery::default()
        };
        let err = query.resolve(PositionOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }
}
