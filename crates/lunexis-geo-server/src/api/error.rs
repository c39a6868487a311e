//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lunexis_geo_core::GeoError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from client.
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 403 Forbidden - Location access was refused.
    Forbidden {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 404 Not Found - Resource does not exist.
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional details.
        details: Option<String>,
    },

    /// 501 Not Implemented - The feature has no backend yet.
    NotImplemented {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 502 Bad Gateway - The geocoder failed or answered nonsense.
    BadGateway {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 503 Service Unavailable - The location provider cannot deliver a fix.
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 504 Gateway Timeout - No fix within the requested timeout.
    GatewayTimeout {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "permission_denied",
    "message": "Location permission denied. Grant location access and try again.",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "position_unavailable").
    #[schema(example = "permission_denied")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "Location permission denied. Grant location access and try again.")]
    pub message: String,

    /// Optional additional details for debugging.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Shorthand for a 400 response.
    pub fn bad_request(error_code: &str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a 404 response.
    pub fn not_found(error_code: &str, message: impl Into<String>) -> Self {
        Self::NotFound {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }

    /// The HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_response = match self {
            Self::InternalError {
                error_code,
                message,
                details,
            } => {
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    details = ?details,
                    "Internal server error"
                );

                ErrorResponse {
                    error: error_code,
                    message,
                    details: details.map(|d| serde_json::json!(d)),
                }
            }

            Self::BadRequest { error_code, message }
            | Self::Forbidden { error_code, message }
            | Self::NotFound { error_code, message }
            | Self::NotImplemented { error_code, message }
            | Self::BadGateway { error_code, message }
            | Self::ServiceUnavailable { error_code, message }
            | Self::GatewayTimeout { error_code, message } => ErrorResponse {
                error: error_code,
                message,
                details: None,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "Bad Request: {message}"),
            Self::Forbidden { message, .. } => write!(f, "Forbidden: {message}"),
            Self::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            Self::InternalError { message, .. } => write!(f, "Internal Error: {message}"),
            Self::NotImplemented { message, .. } => write!(f, "Not Implemented: {message}"),
            Self::BadGateway { message, .. } => write!(f, "Bad Gateway: {message}"),
            Self::ServiceUnavailable { message, .. } => {
                write!(f, "Service Unavailable: {message}")
            }
            Self::GatewayTimeout { message, .. } => write!(f, "Gateway Timeout: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Convert from lunexis-geo-core errors.
impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        let error_code = err.error_code().to_ascii_lowercase();
        let message = err.to_string();

        match err {
            GeoError::InvalidRegion { .. } => Self::BadRequest { error_code, message },
            GeoError::PermissionDenied => Self::Forbidden { error_code, message },
            GeoError::Unsupported | GeoError::PositionUnavailable(_) => {
                Self::ServiceUnavailable { error_code, message }
            }
            GeoError::Timeout => Self::GatewayTimeout { error_code, message },
            GeoError::GeocodingRequestFailed(_) => Self::BadGateway { error_code, message },
            GeoError::PlacesNotIntegrated => Self::NotImplemented { error_code, message },
            GeoError::ConfigNotFound(_)
            | GeoError::ConfigParseError(_)
            | GeoError::ConfigValidationError(_)
            | GeoError::IoError(_) => Self::InternalError {
                error_code,
                message,
                details: None,
            },
        }
    }
}
