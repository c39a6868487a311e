//! Application configuration management.
//!
//! Configuration is layered, later layers winning:
//! 1. Built-in defaults ([`GeoConfig::default`])
//! 2. An optional TOML file, at `$LUNEXIS_GEO_CONFIG` or the platform config
//!    directory (`~/.config/lunexis-geo/config.toml` on Linux)
//! 3. Environment variables prefixed `LUNEXIS_GEO__`, with `__` separating
//!    nested keys, e.g. `LUNEXIS_GEO__PROVIDER__PORT=2948`
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:8080"
//!
//! [provider]
//! kind = "gpsd"
//! host = "127.0.0.1"
//! port = 2947
//!
//! [watch]
//! accuracy = "high"
//! maximum_age_ms = 0
//! timeout_ms = 10000
//! auto_start = true
//!
//! [[regions]]
//! id = "home"
//! latitude = 37.7749
//! longitude = -122.4194
//! radius = 100.0
//! name = "Home"
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::GeoError;
use crate::geofence::validate_region;
use crate::platform::{AccuracyTier, PositionOptions};
use crate::types::GeofenceRegion;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "LUNEXIS_GEO_CONFIG";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LUNEXIS_GEO";

/// Separator between the prefix and nested keys in environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Writing the config file failed.
    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A layer could not be read or merged into [`GeoConfig`].
    #[error("failed to load configuration: {0}")]
    ParseError(#[from] ::config::ConfigError),

    /// The config could not be rendered as TOML.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// One field failed validation.
    #[error("invalid {field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields failed validation.
    #[error("{} configuration problems", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Which location provider the server drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// A gpsd daemon over TCP.
    #[default]
    Gpsd,
    /// The scripted in-process provider.
    Mock,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind_address", format!("{e}")))
    }
}

/// Location provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider backend.
    pub kind: ProviderKind,
    /// gpsd host.
    pub host: String,
    /// gpsd port.
    pub port: u16,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gpsd,
            host: "127.0.0.1".to_string(),
            port: 2947,
        }
    }
}

/// Defaults for position requests and the watch loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Requested accuracy tier.
    pub accuracy: AccuracyTier,
    /// Oldest cached fix to accept, in milliseconds.
    pub maximum_age_ms: u64,
    /// Fix timeout in milliseconds.
    pub timeout_ms: u64,
    /// Start watching as soon as the server is up.
    pub auto_start: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::High,
            maximum_age_ms: 0,
            timeout_ms: 10_000,
            auto_start: false,
        }
    }
}

impl WatchConfig {
    /// Provider options described by this section.
    #[must_use]
    pub const fn to_position_options(&self) -> PositionOptions {
        PositionOptions {
            accuracy: self.accuracy,
            maximum_age: Duration::from_millis(self.maximum_age_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Geocoding endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible API.
    pub base_url: String,
    /// User-Agent sent with every request. Public Nominatim requires one.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/".to_string(),
            user_agent: concat!("lunexis-geo/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// HTTP server.
    pub server: ServerConfig,
    /// Location provider.
    pub provider: ProviderConfig,
    /// Position request defaults.
    pub watch: WatchConfig,
    /// Geocoding endpoint.
    pub geocoding: GeocodingConfig,
    /// Regions loaded into the registry at start-up.
    pub regions: Vec<GeofenceRegion>,
}

impl GeoConfig {
    /// Load configuration from the default file location and environment.
    ///
    /// A missing default file is fine. A missing file named by
    /// `$LUNEXIS_GEO_CONFIG` is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be read or the merged result is
    /// not a valid configuration.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Self::load_with(Some(&path), Self::environment())
            }
            None => {
                let path = Self::default_path().filter(|p| p.exists());
                Self::load_with(path.as_deref(), Self::environment())
            }
        }
    }

    /// Load from a specific file (if any) and environment source, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be read or validation fails.
    pub fn load_with(
        path: Option<&Path>,
        environment: ::config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: Self = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The process environment as a config source.
    #[must_use]
    pub fn environment() -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    /// The platform config file path, if a home directory can be found.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lunexis-geo")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns the single problem, or [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.server.socket_addr() {
            errors.push(e);
        }

        if self.provider.kind == ProviderKind::Gpsd {
            if self.provider.host.trim().is_empty() {
                errors.push(ConfigError::invalid("provider.host", "must not be empty"));
            }
            if self.provider.port == 0 {
                errors.push(ConfigError::invalid("provider.port", "must not be 0"));
            }
        }

        if self.watch.timeout_ms == 0 {
            errors.push(ConfigError::invalid("watch.timeout_ms", "must be greater than 0"));
        }

        match Url::parse(&self.geocoding.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ConfigError::invalid(
                "geocoding.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ConfigError::invalid("geocoding.base_url", e.to_string())),
        }
        if self.geocoding.user_agent.trim().is_empty() {
            errors.push(ConfigError::invalid("geocoding.user_agent", "must not be empty"));
        }
        if self.geocoding.timeout_secs == 0 {
            errors.push(ConfigError::invalid(
                "geocoding.timeout_secs",
                "must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for (i, region) in self.regions.iter().enumerate() {
            if let Err(GeoError::InvalidRegion { field, message }) = validate_region(region) {
                errors.push(ConfigError::invalid(format!("regions[{i}].{field}"), message));
            }
            if !seen.insert(region.id.as_str()) {
                errors.push(ConfigError::invalid(
                    format!("regions[{i}].id"),
                    format!("duplicate region id '{}'", region.id),
                ));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_error = |source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)?;
        Ok(())
    }
}
