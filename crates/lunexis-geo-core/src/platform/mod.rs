//! Host location capability.
//!
//! A [`LocationProvider`] is whatever the host offers for producing position
//! fixes: a gpsd daemon, a mobile OS bridge, or a scripted mock in tests.
//! Providers hand back loosely-typed [`RawReading`]s; normalizing them into
//! [`Position`](crate::types::Position)s is the watcher's job.
//!
//! Capability is described by an explicit [`Capability`] value that the
//! service queries once at start-up, instead of probing optional APIs at
//! every call site.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use utoipa::ToSchema;

#[cfg(feature = "gpsd")]
pub mod gpsd;
#[cfg(any(test, feature = "mock-location"))]
pub mod mock;

/// Errors reported by a location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The user or OS refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// The host has no location capability.
    #[error("location capability unsupported")]
    Unsupported,

    /// The provider could not produce a fix.
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    /// No fix within the requested timeout.
    #[error("timed out acquiring a fix")]
    Timeout,
}

/// What the host can do, evaluated once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Capability {
    /// No location source exists.
    Unsupported,
    /// A location source exists.
    Available {
        /// Whether the provider can report permission state ahead of a request.
        permission_query: bool,
    },
}

impl Capability {
    /// Whether a location source exists.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Whether [`LocationProvider::permission_state`] is meaningful.
    #[must_use]
    pub const fn supports_permission_query(&self) -> bool {
        matches!(
            self,
            Self::Available {
                permission_query: true
            }
        )
    }
}

/// Result of a permission query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Access granted.
    Granted,
    /// The platform will ask the user on first request.
    Prompt,
    /// Access refused.
    Denied,
}

/// Desired accuracy of position fixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    /// Best available fix, at a higher power or latency cost.
    #[default]
    High,
    /// Reasonable fix quality.
    Balanced,
    /// Coarse location is fine.
    Low,
}

/// Options passed through to the provider for each request or watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Desired accuracy tier.
    pub accuracy: AccuracyTier,
    /// Oldest cached fix the caller will accept.
    pub maximum_age: Duration,
    /// How long to wait for a fix.
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::High,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A reading as the platform reported it. Any field may be garbage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReading {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    /// Altitude in meters.
    pub altitude: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Speed in meters per second.
    pub speed: Option<f64>,
    /// Epoch milliseconds of the fix, if the platform stamped it.
    pub timestamp_ms: Option<i64>,
}

/// Items delivered by a watch subscription.
pub type WatchItem = Result<RawReading, PlatformError>;

/// A live watch subscription. Dropping it cancels the subscription.
pub type WatchStream = mpsc::Receiver<WatchItem>;

/// Channel capacity used by providers for watch subscriptions.
pub const WATCH_CHANNEL_CAPACITY: usize = 64;

/// A host location source.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Detect what the host supports.
    async fn capability(&self) -> Capability;

    /// Current permission state. Only meaningful when
    /// [`Capability::supports_permission_query`] is true.
    async fn permission_state(&self) -> PermissionState;

    /// Request a single fix.
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<RawReading, PlatformError>;

    /// Begin continuous delivery of fixes.
    ///
    /// Per-reading failures arrive as `Err` items; the stream keeps going.
    async fn watch(&self, options: &PositionOptions) -> Result<WatchStream, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags() {
        assert!(!Capability::Unsupported.is_available());
        assert!(Capability::Available {
            permission_query: false
        }
        .is_available());
        assert!(!Capability::Available {
            permission_query: false
        }
        .supports_permission_query());
        assert!(Capability::Available {
            permission_query: true
        }
        .supports_permission_query());
    }

    #[test]
    fn test_capability_serialization() {
        let json = serde_json::to_string(&Capability::Available {
            permission_query: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"available","permission_query":true}"#);
        assert_eq!(
            serde_json::to_string(&Capability::Unsupported).unwrap(),
            r#"{"status":"unsupported"}"#
        );
    }

    #[test]
    fn test_accuracy_tier_parses_snake_case() {
        let tier: AccuracyTier = serde_json::from_str("\"balanced\"").unwrap();
        assert_eq!(tier, AccuracyTier::Balanced);
        assert_eq!(AccuracyTier::default(), AccuracyTier::High);
    }
}
