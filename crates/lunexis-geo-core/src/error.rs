//! Unified error types for the geolocation core library.
//!
//! This module provides a unified error type [`GeoError`] that covers all failure
//! modes across the geolocation unit. Some modules also have their own specific
//! error types ([`ConfigError`](crate::config::ConfigError),
//! [`PlatformError`](crate::platform::PlatformError)) for internal use.
//!
//! # Failure semantics
//!
//! - **Terminal**: `PermissionDenied` and `Unsupported` need user action
//!   (re-grant permission, run on a capable host). Callers should stop retrying.
//! - **Transient**: `PositionUnavailable`, `Timeout` and `GeocodingRequestFailed`
//!   may succeed when the call is simply re-invoked.
//! - Nothing in this crate retries on its own.
//!
//! # Example
//!
//! ```rust
//! use lunexis_geo_core::error::{GeoError, Result};
//!
//! fn require_fix(fix: Option<(f64, f64)>) -> Result<(f64, f64)> {
//!     fix.ok_or_else(|| GeoError::PositionUnavailable("no satellites".into()))
//! }
//!
//! assert!(require_fix(None).unwrap_err().is_transient());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for all geolocation operations.
#[derive(Debug, Error)]
pub enum GeoError {
    // =========================================================================
    // PLATFORM LOCATION ERRORS
    // =========================================================================
    /// The user or operating system declined location access.
    #[error("Location permission denied. Grant location access and try again.")]
    PermissionDenied,

    /// The host offers no location capability at all.
    #[error("Location services are not supported on this platform.")]
    Unsupported,

    /// The platform could not produce a position fix.
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// No fix arrived within the requested window.
    #[error("Timed out waiting for a position fix.")]
    Timeout,

    // =========================================================================
    // GEOCODING ERRORS
    // =========================================================================
    /// The geocoding endpoint could not be reached or returned garbage.
    #[error("Geocoding request failed: {0}")]
    GeocodingRequestFailed(String),

    /// Nearby-places lookup has no provider behind it yet.
    #[error("Nearby places lookup is not integrated with a places provider yet.")]
    PlacesNotIntegrated,

    // =========================================================================
    // GEOFENCE ERRORS
    // =========================================================================
    /// A geofence region failed validation.
    #[error("Invalid geofence region '{field}': {message}")]
    InvalidRegion {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for geolocation operations.
pub type Result<T> = std::result::Result<T, GeoError>;

impl GeoError {
    /// Returns `true` for errors that require user action before retrying.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unsupported)
    }

    /// Returns `true` for errors where re-invoking the call may succeed.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PositionUnavailable(_) | Self::Timeout | Self::GeocodingRequestFailed(_)
        )
    }

    /// Returns `true` if this error came from the platform location layer.
    #[inline]
    #[must_use]
    pub const fn is_location_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::Unsupported
                | Self::PositionUnavailable(_)
                | Self::Timeout
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidRegion { .. } => 400,

            // 403 Forbidden - user declined access
            Self::PermissionDenied => 403,

            // 404 Not Found
            Self::ConfigNotFound(_) => 404,

            // 422 Unprocessable Entity - semantic errors
            Self::ConfigParseError(_) | Self::ConfigValidationError(_) => 422,

            // 500 Internal Server Error - server-side issues
            Self::IoError(_) => 500,

            // 501 Not Implemented
            Self::PlacesNotIntegrated => 501,

            // 502 Bad Gateway - upstream geocoder misbehaved
            Self::GeocodingRequestFailed(_) => 502,

            // 503 Service Unavailable - location hardware issues
            Self::Unsupported | Self::PositionUnavailable(_) => 503,

            // 504 Gateway Timeout
            Self::Timeout => 504,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Unsupported => "UNSUPPORTED",
            Self::PositionUnavailable(_) => "POSITION_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
            Self::GeocodingRequestFailed(_) => "GEOCODING_REQUEST_FAILED",
            Self::PlacesNotIntegrated => "PLACES_NOT_INTEGRATED",
            Self::InvalidRegion { .. } => "INVALID_REGION",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::platform::PlatformError> for GeoError {
    fn from(err: crate::platform::PlatformError) -> Self {
        use crate::platform::PlatformError;
        match err {
            PlatformError::PermissionDenied => Self::PermissionDenied,
            PlatformError::Unsupported => Self::Unsupported,
            PlatformError::PositionUnavailable(message) => Self::PositionUnavailable(message),
            PlatformError::Timeout => Self::Timeout,
        }
    }
}

impl From<crate::config::ConfigError> for GeoError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::WriteError { path, source } => Self::IoError(std::io::Error::new(
                source.kind(),
                format!("Failed to write {}: {source}", path.display()),
            )),
            ConfigError::ParseError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::SerializeError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
