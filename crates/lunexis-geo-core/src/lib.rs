//! # lunexis-geo-core
//!
//! Core geolocation logic for the Lunexis location unit.
//!
//! This crate provides:
//! - Position watching on top of a host location provider
//! - Circular geofence regions evaluated against every position
//! - Forward and reverse geocoding over a Nominatim-compatible API
//! - Layered configuration (defaults, TOML file, environment)
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`platform`] - The [`LocationProvider`] seam plus gpsd and mock bindings
//! - [`watcher`] - [`GeolocationService`]: watch lifecycle, subscribers, fan-out
//! - [`geofence`] - Region validation and the ordered region registry
//! - [`proximity`] - Haversine distance and region containment
//! - [`geocoding`] - HTTP geocoding client
//! - [`config`] - Configuration loading, saving, and validation
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared types and OpenAPI schemas
//!
//! ## Example
//!
//! ```rust
//! use lunexis_geo_core::{proximity, GeofenceRegion, Position};
//!
//! let home = GeofenceRegion::new("home", 37.7749, -122.4194, 100.0);
//! let here = Position {
//!     latitude: 37.7750,
//!     longitude: -122.4195,
//!     accuracy: 8.0,
//!     altitude: None,
//!     heading: None,
//!     speed: None,
//!     timestamp: chrono::Utc::now(),
//! };
//!
//! let triggered = proximity::evaluate(&here, &[home]);
//! assert_eq!(triggered.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod geocoding;
pub mod geofence;
pub mod platform;
pub mod proximity;
pub mod types;
pub mod watcher;

// Re-export primary types for convenience
pub use config::{
    ConfigError, GeoConfig, GeocodingConfig, ProviderConfig, ProviderKind, ServerConfig,
    WatchConfig,
};
pub use error::{GeoError, Result};
pub use geocoding::{format_coordinates, GeocodeResult, GeocodingClient, Place};
pub use geofence::{is_valid_region_id, validate_region, GeofenceRegistry, MAX_REGION_ID_LENGTH};
#[cfg(feature = "gpsd")]
pub use platform::gpsd::GpsdProvider;
#[cfg(any(test, feature = "mock-location"))]
pub use platform::mock::MockLocationProvider;
pub use platform::{
    AccuracyTier, Capability, LocationProvider, PermissionState, PlatformError, PositionOptions,
    RawReading,
};
pub use proximity::haversine_distance;
pub use types::{Coordinate, GeofenceRegion, LocationUpdate, Position};
pub use watcher::{normalize_reading, GeolocationService, MalformedReading, SubscriptionId};
