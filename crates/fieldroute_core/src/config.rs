//! Runtime configuration for the route pipeline.
//!
//! # Responsibility
//! - Describe remote endpoints, rate limits, map view tuning and cache location.
//! - Load from JSON and apply `FIELDROUTE_*` environment overrides.
//!
//! # Invariants
//! - Every field has a working default; an empty JSON object is a valid config.
//! - `validate()` runs after overrides, before any component is built.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_GEOCODE_KEY: &str = "FIELDROUTE_GEOCODE_KEY";
pub const ENV_GEOCODE_URL: &str = "FIELDROUTE_GEOCODE_URL";
pub const ENV_OPTIMIZER_URL: &str = "FIELDROUTE_OPTIMIZER_URL";
pub const ENV_TRIP_URL: &str = "FIELDROUTE_TRIP_URL";
pub const ENV_CACHE_DB: &str = "FIELDROUTE_CACHE_DB";

const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_OPTIMIZER_URL: &str = "http://localhost:8080/optimize-route";
const DEFAULT_TRIP_URL: &str = "https://router.project-osrm.org/trip/v1/driving";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub geocoding: GeocodingConfig,
    pub optimization: OptimizationConfig,
    pub trip_planner: TripPlannerConfig,
    pub map: MapViewConfig,
    pub collector: CollectorConfig,
    /// Durable geocode cache file; `None` keeps the cache in memory.
    pub cache_db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Pause between consecutive remote geocoding calls.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODE_URL.to_string(),
            api_key: None,
            request_delay_ms: 100,
            timeout_secs: 10,
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OPTIMIZER_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

impl OptimizationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TripPlannerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for TripPlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TRIP_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

impl TripPlannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Viewport tuning for route display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    /// Zoom used when the route has a single drawable stop.
    pub single_stop_zoom: u8,
    pub fit_padding_px: u32,
    /// Ceiling applied when fitting bounds so close stops are not over-zoomed.
    pub max_fit_zoom: u8,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            single_stop_zoom: 15,
            fit_padding_px: 50,
            max_fit_zoom: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Shortest address text accepted as plausible.
    pub min_address_len: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { min_address_len: 5 }
    }
}

impl RouteConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies `FIELDROUTE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = read(ENV_GEOCODE_KEY) {
            self.geocoding.api_key = Some(key);
        }
        if let Some(url) = read(ENV_GEOCODE_URL) {
            self.geocoding.endpoint = url;
        }
        if let Some(url) = read(ENV_OPTIMIZER_URL) {
            self.optimization.endpoint = url;
        }
        if let Some(url) = read(ENV_TRIP_URL) {
            self.trip_planner.endpoint = url;
        }
        if let Some(path) = read(ENV_CACHE_DB) {
            self.cache_db_path = Some(PathBuf::from(path));
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("geocoding.endpoint", &self.geocoding.endpoint),
            ("optimization.endpoint", &self.optimization.endpoint),
            ("trip_planner.endpoint", &self.trip_planner.endpoint),
        ] {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} cannot be empty")));
            }
        }
        for (name, timeout_secs) in [
            ("geocoding.timeout_secs", self.geocoding.timeout_secs),
            ("optimization.timeout_secs", self.optimization.timeout_secs),
            ("trip_planner.timeout_secs", self.trip_planner.timeout_secs),
        ] {
            if timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        if self.map.max_fit_zoom == 0 {
            return Err(ConfigError::Invalid(
                "map.max_fit_zoom must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RouteConfig, ENV_CACHE_DB, ENV_GEOCODE_KEY};
    use std::path::PathBuf;

    #[test]
    fn empty_object_uses_defaults() {
        let config = RouteConfig::from_json_str("{}").expect("defaults should be valid");
        assert_eq!(config.map.max_fit_zoom, 16);
        assert_eq!(config.geocoding.request_delay_ms, 100);
        assert!(config.cache_db_path.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            RouteConfig::from_json_str(r#"{"map": {"single_stop_zoom": 12}}"#).unwrap();
        assert_eq!(config.map.single_stop_zoom, 12);
        assert_eq!(config.map.fit_padding_px, 50);
    }

    #[test]
    fn rejects_empty_endpoint() {
        let error =
            RouteConfig::from_json_str(r#"{"optimization": {"endpoint": " "}}"#).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(message) if message.contains("optimization")));
    }

    #[test]
    fn rejects_zero_timeout() {
        let error =
            RouteConfig::from_json_str(r#"{"trip_planner": {"timeout_secs": 0}}"#).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(message) if message.contains("trip_planner")));
        assert!(RouteConfig::from_json_str(r#"{"geocoding": {"timeout_secs": 1}}"#).is_ok());
    }

    #[test]
    fn overrides_replace_non_empty_values_only() {
        let mut config = RouteConfig::default();
        config
            .apply_overrides(|name| match name {
                ENV_GEOCODE_KEY => Some("secret".to_string()),
                ENV_CACHE_DB => Some("/tmp/geo.sqlite3".to_string()),
                _ => Some(String::new()),
            })
            .unwrap();
        assert_eq!(config.geocoding.api_key.as_deref(), Some("secret"));
        assert_eq!(config.cache_db_path, Some(PathBuf::from("/tmp/geo.sqlite3")));
        assert!(!config.geocoding.endpoint.is_empty());
    }
}
