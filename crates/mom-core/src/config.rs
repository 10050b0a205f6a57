//! Configuration loading.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `<config dir>/mom/config.toml` (user-global)
//! 3. `mom.toml` in the working directory
//! 4. `MOM_*` environment variables
//!
//! Files are merged key by key: a local file that only sets `[web]` keeps the
//! global `[places]` key.
//!
//! CLI flags are layered on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MomError, MomResult};
use crate::geo::Coordinate;

/// Default Places API host.
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com";

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "mom.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MomConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality for the re-encoded still (1-100).
    pub quality: u8,
    pub allow_editing: bool,
    /// Command that writes a still image to stdout, e.g. `libcamera-still -o -`.
    pub camera_command: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            allow_editing: true,
            camera_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub timeout_ms: u64,
    pub high_accuracy: bool,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            high_accuracy: true,
            lat: None,
            lng: None,
        }
    }
}

impl LocationConfig {
    /// The configured fixed position, if both halves are present.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub radius_m: u32,
    pub max_results: usize,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PLACES_URL.to_string(),
            radius_m: 10_000,
            max_results: 10,
        }
    }
}

impl PlacesConfig {
    /// Credential with blank values treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl MomConfig {
    /// Load from the global file, the local file and the environment.
    pub fn load() -> MomResult<Self> {
        let mut layers = Vec::new();

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!(path = %global.display(), "Loading config file");
                layers.push(std::fs::read_to_string(&global)?);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            debug!(path = %local.display(), "Loading config file");
            layers.push(std::fs::read_to_string(&local)?);
        }

        let mut config = Self::from_layers(&layers)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge TOML documents, later ones overriding earlier ones per key.
    pub fn from_layers<S: AsRef<str>>(layers: &[S]) -> MomResult<Self> {
        let mut merged = toml::Table::new();
        for layer in layers {
            let table: toml::Table =
                toml::from_str(layer.as_ref()).map_err(|e| MomError::Config(e.to_string()))?;
            merge_tables(&mut merged, table);
        }
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| MomError::Config(e.to_string()))
    }

    /// Parse a single TOML file.
    pub fn from_file(path: &Path) -> MomResult<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading config file");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> MomResult<Self> {
        toml::from_str(content).map_err(|e| MomError::Config(e.to_string()))
    }

    /// Apply `MOM_*` overrides through the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> MomResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("MOM_PLACES_API_KEY") {
            self.places.api_key = Some(key);
        }
        if let Some(url) = lookup("MOM_PLACES_BASE_URL") {
            self.places.base_url = url;
        }
        if let Some(cmd) = lookup("MOM_CAMERA_COMMAND") {
            self.capture.camera_command = Some(cmd);
        }
        if let Some(port) = lookup("MOM_WEB_PORT") {
            self.web.port = port
                .parse()
                .map_err(|_| MomError::Config(format!("MOM_WEB_PORT is not a port: {port}")))?;
        }
        if let Some(timeout) = lookup("MOM_LOCATION_TIMEOUT_MS") {
            self.location.timeout_ms = timeout.parse().map_err(|_| {
                MomError::Config(format!("MOM_LOCATION_TIMEOUT_MS is not a number: {timeout}"))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> MomResult<()> {
        if !(1..=100).contains(&self.capture.quality) {
            return Err(MomError::Config(format!(
                "capture.quality must be 1-100, got {}",
                self.capture.quality
            )));
        }
        if self.places.max_results == 0 {
            return Err(MomError::Config("places.max_results must be positive".into()));
        }
        if let Some(coord) = self.location.coordinate() {
            if !coord.is_valid() {
                return Err(MomError::Config(format!("location {coord} is out of range")));
            }
        }
        Ok(())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mom").join("config.toml"))
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = MomConfig::default();
        assert_eq!(config.capture.quality, 90);
        assert!(config.capture.allow_editing);
        assert_eq!(config.location.timeout_ms, 10_000);
        assert_eq!(config.places.radius_m, 10_000);
        assert_eq!(config.places.max_results, 10);
        assert_eq!(config.web.port, 3030);
        assert!(config.places.credential().is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = MomConfig::from_toml(
            "[places]\napi_key = \"abc\"\n\n[location]\nlat = 40.0\nlng = -3.5\n",
        )
        .unwrap();
        assert_eq!(config.places.credential(), Some("abc"));
        assert_eq!(config.places.base_url, DEFAULT_PLACES_URL);
        assert_eq!(config.location.coordinate(), Some(Coordinate::new(40.0, -3.5)));
        assert_eq!(config.capture.quality, 90);
    }

    #[test]
    fn test_local_file_keeps_global_keys() {
        let global = "[places]\napi_key = \"global-key\"\nradius_m = 5000\n\n[web]\nport = 4000\n";
        let local = "[web]\nport = 8081\n\n[places]\nradius_m = 2000\n";
        let config = MomConfig::from_layers(&[global, local]).unwrap();
        assert_eq!(config.places.credential(), Some("global-key"));
        assert_eq!(config.places.radius_m, 2000);
        assert_eq!(config.web.port, 8081);
        assert_eq!(config.web.host, "127.0.0.1");
    }

    #[test]
    fn test_no_layers_is_default() {
        let config = MomConfig::from_layers::<&str>(&[]).unwrap();
        assert_eq!(config.places.max_results, 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("MOM_PLACES_API_KEY", "from-env"), ("MOM_WEB_PORT", "8080")].into();
        let mut config = MomConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.places.credential(), Some("from-env"));
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = MomConfig::default();
        let err = config
            .apply_env(|k| (k == "MOM_WEB_PORT").then(|| "nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, MomError::Config(_)));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let mut config = MomConfig::default();
        config.places.api_key = Some("   ".into());
        assert!(config.places.credential().is_none());
    }

    #[test]
    fn test_quality_range() {
        let mut config = MomConfig::default();
        config.capture.quality = 0;
        assert!(config.validate().is_err());
    }
}
