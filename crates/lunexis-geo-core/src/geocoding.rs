//! Forward and reverse geocoding over a Nominatim-compatible HTTP API.
//!
//! Only the fields we need are read from the JSON responses; anything else
//! the server sends is ignored.
//!
//! Failure policy differs per call:
//! - [`GeocodingClient::reverse_geocode`] never fails. On any error it logs
//!   and returns the coordinates formatted to six decimal places.
//! - [`GeocodingClient::geocode`] returns `Ok(None)` when nothing matched and
//!   `Err(GeoError::GeocodingRequestFailed)` when the request itself failed.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;
use utoipa::ToSchema;

use crate::config::GeocodingConfig;
use crate::error::{GeoError, Result};
use crate::types::Coordinate;

/// A forward geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "coordinate": { "latitude": 37.7792808, "longitude": -122.4192363 },
    "display_name": "San Francisco, California, United States"
}))]
pub struct GeocodeResult {
    /// Where the address resolved to.
    pub coordinate: Coordinate,

    /// The geocoder's formatted name for the match.
    pub display_name: String,
}

/// A point of interest near a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Place {
    /// Place name.
    pub name: String,

    /// Place location.
    pub coordinate: Coordinate,

    /// Provider category, e.g. "cafe".
    pub category: Option<String>,

    /// Distance from the query point in meters.
    pub distance_meters: f64,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

/// Format a coordinate pair as `"lat, lon"` with six decimals.
///
/// ```rust
/// use lunexis_geo_core::geocoding::format_coordinates;
///
/// assert_eq!(format_coordinates(37.7749, -122.4194), "37.774900, -122.419400");
/// ```
#[must_use]
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.6}, {longitude:.6}")
}

/// HTTP client for the geocoding endpoints.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: Url,
}

impl GeocodingClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::ConfigValidationError`] for an unusable base URL
    /// and [`GeoError::GeocodingRequestFailed`] if the HTTP client cannot be built.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            GeoError::ConfigValidationError(format!("geocoding.base_url: {e}"))
        })?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeoError::GeocodingRequestFailed(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// The endpoint base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| GeoError::GeocodingRequestFailed(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeoError::GeocodingRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::GeocodingRequestFailed(format!(
                "geocoder returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GeoError::GeocodingRequestFailed(format!("invalid response body: {e}")))
    }

    async fn try_reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String> {
        let mut url = self.endpoint("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string());

        let body: ReverseResponse = self.get_json(url).await?;
        body.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| GeoError::GeocodingRequestFailed("response has no display_name".into()))
    }

    /// Turn coordinates into a human-readable label.
    ///
    /// Falls back to [`format_coordinates`] on any failure.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        match self.try_reverse_geocode(latitude, longitude).await {
            Ok(name) => name,
            Err(e) => {
                warn!(latitude, longitude, error = %e, "reverse geocoding failed, using coordinates");
                format_coordinates(latitude, longitude)
            }
        }
    }

    /// Resolve an address to coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::GeocodingRequestFailed`] when the request fails or
    /// the response cannot be read. An empty match list is `Ok(None)`.
    pub async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("limit", "1")
            .append_pair("q", address);

        let hits: Vec<SearchHit> = self.get_json(url).await?;
        let Some(hit) = hits.into_iter().next() else {
            debug!(address, "no geocoding match");
            return Ok(None);
        };

        let parse = |field: &str, value: &str| {
            value.parse::<f64>().map_err(|_| {
                GeoError::GeocodingRequestFailed(format!("{field} is not a number: {value:?}"))
            })
        };
        let coordinate = Coordinate::new(parse("lat", &hit.lat)?, parse("lon", &hit.lon)?);

        Ok(Some(GeocodeResult {
            coordinate,
            display_name: hit.display_name,
        }))
    }

    /// Points of interest around a coordinate.
    ///
    /// # Errors
    ///
    /// Always returns [`GeoError::PlacesNotIntegrated`]; no places provider is
    /// wired up yet.
    #[allow(clippy::unused_async)]
    pub async fn nearby_places(
        &self,
        _latitude: f64,
        _longitude: f64,
        _radius_meters: f64,
    ) -> Result<Vec<Place>> {
        Err(GeoError::PlacesNotIntegrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> GeocodingConfig {
        GeocodingConfig {
            base_url: base_url.to_string(),
            ..GeocodingConfig::default()
        }
    }

    #[test]
    fn test_format_coordinates_six_decimals() {
        assert_eq!(format_coordinates(37.7749, -122.4194), "37.774900, -122.419400");
        assert_eq!(format_coordinates(0.0, 0.0), "0.000000, 0.000000");
        assert_eq!(format_coordinates(-1.234_567_89, 2.5), "-1.234568, 2.500000");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = GeocodingClient::new(&config("https://geo.example.com/nominatim")).unwrap();
        assert_eq!(
            client.endpoint("search").unwrap().as_str(),
            "https://geo.example.com/nominatim/search"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = GeocodingClient::new(&config("not a url")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_nearby_places_is_not_integrated() {
        let client = GeocodingClient::new(&GeocodingConfig::default()).unwrap();
        let err = client.nearby_places(37.7749, -122.4194, 500.0).await.unwrap_err();
        assert!(matches!(err, GeoError::PlacesNotIntegrated));
    }
}
