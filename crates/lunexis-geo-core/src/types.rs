//! Shared types and OpenAPI schemas.
//!
//! These are the values that cross module boundaries: positions produced by
//! the watcher, regions stored in the registry, and the combined updates
//! delivered to subscribers. Timestamps serialize as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    /// Latitude in degrees (-90..=90).
    #[schema(example = 37.7749)]
    pub latitude: f64,

    /// Longitude in degrees (-180..=180).
    #[schema(example = -122.4194)]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.latitude) && is_valid_longitude(self.longitude)
    }
}

/// Returns `true` if `lat` is finite and within -90..=90.
#[must_use]
pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

/// Returns `true` if `lon` is finite and within -180..=180.
#[must_use]
pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=180.0).contains(&lon)
}

/// A normalized position reading.
///
/// Created fresh for every accepted platform reading and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "latitude": 37.7749,
    "longitude": -122.4194,
    "accuracy": 12.5,
    "altitude": 16.0,
    "heading": null,
    "speed": 0.0,
    "timestamp": 1736912400000_i64
}))]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,

    /// Altitude in meters, if the platform reports one.
    pub altitude: Option<f64>,

    /// Direction of travel in degrees clockwise from true north.
    pub heading: Option<f64>,

    /// Ground speed in meters per second.
    pub speed: Option<f64>,

    /// When the platform took the reading.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// The coordinate part of this position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The timestamp as epoch milliseconds.
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// A circular geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "home",
    "latitude": 37.7749,
    "longitude": -122.4194,
    "radius": 100.0,
    "name": "Home"
}))]
pub struct GeofenceRegion {
    /// Unique identifier within the registry.
    pub id: String,

    /// Center latitude in degrees.
    pub latitude: f64,

    /// Center longitude in degrees.
    pub longitude: f64,

    /// Radius in meters.
    pub radius: f64,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GeofenceRegion {
    /// Create a region without a display name.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            radius,
            name: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The region's center.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// One position together with the regions it falls inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdate {
    /// The accepted position.
    pub position: Position,

    /// Regions whose radius contains the position, in registry order.
    pub triggered: Vec<GeofenceRegion>,

    /// When this update was produced.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub generated_at: DateTime<Utc>,
}

impl LocationUpdate {
    /// Ids of the triggered regions.
    #[must_use]
    pub fn triggered_ids(&self) -> Vec<&str> {
        self.triggered.iter().map(|r| r.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_position_timestamp_serializes_as_millis() {
        let position = Position {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 3.0,
            altitude: None,
            heading: None,
            speed: None,
            timestamp: Utc.timestamp_millis_opt(1_736_912_400_123).unwrap(),
        };
        let json = serde_json::to_string(&position).unwrap();
        assert!(json.contains("\"timestamp\":1736912400123"));
        assert_eq!(position.timestamp_millis(), 1_736_912_400_123);
    }

    #[test]
    fn test_region_name_is_optional_in_json() {
        let region: GeofenceRegion =
            serde_json::from_str(r#"{"id":"gym","latitude":1.0,"longitude":2.0,"radius":50.0}"#)
                .unwrap();
        assert_eq!(region.name, None);
        assert!(!serde_json::to_string(&region).unwrap().contains("name"));

        let named = region.with_name("Gym");
        assert_eq!(named.name.as_deref(), Some("Gym"));
    }
}
