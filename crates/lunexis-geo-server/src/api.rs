//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `health` - Service health checks
//! - `config` - Effective configuration
//! - `location` - Position fixes, watch lifecycle, update stream
//! - `geofences` - Region management and evaluation
//! - `geocode` - Forward and reverse geocoding
//! - `places` - Nearby places lookup
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod config;
pub mod error;
pub mod geocode;
pub mod geofences;
pub mod health;
pub mod location;
pub mod openapi;
pub mod places;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};

// Re-export OpenAPI utilities for the gen-openapi binary
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                  - Health check
/// /api
/// ├── /config              - Effective configuration
/// ├── /location            - Current/last position, watch control, SSE updates
/// ├── /geofences           - Region CRUD and evaluation
/// ├── /geocode             - Reverse lookup and address search
/// ├── /places              - Nearby places (not integrated)
/// └── /openapi.json        - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                // OpenAPI spec at /api/openapi.json
                .route("/openapi.json", get(openapi::get_openapi_spec))
                .nest("/config", config::router())
                .nest("/location", location::router())
                .nest("/geofences", geofences::router())
                .nest("/geocode", geocode::router())
                .nest("/places", places::router()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
