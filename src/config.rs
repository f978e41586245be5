//! TOML configuration shared by the server and the admin CLI.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub geocoder: GeocoderConfig,
    pub geofence: GeofenceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Nominatim-compatible base URL
    pub base_url: String,
    /// Nominatim rejects requests without an identifying user agent
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause between requests in batch geocoding
    pub batch_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeofenceConfig {
    pub default_radius_m: f64,
    pub bootstrap_on_first_checkin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fencepost-data"),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("fencepost/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 5,
            batch_delay_ms: 1000,
        }
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            default_radius_m: 100.0,
            bootstrap_on_first_checkin: true,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.geocoder.base_url).map_err(|e| {
            Error::Config(format!(
                "Invalid geocoder base_url '{}': {}",
                self.geocoder.base_url, e
            ))
        })?;

        if self.geocoder.timeout_secs == 0 {
            return Err(Error::Config(
                "geocoder.timeout_secs must be positive".to_string(),
            ));
        }

        let radius = self.geofence.default_radius_m;
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::Config(format!(
                "geofence.default_radius_m must be a non-negative number, got {}",
                radius
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:3000");
        assert_eq!(config.geocoder.timeout_secs, 5);
        assert_eq!(config.geofence.default_radius_m, 100.0);
        assert!(config.geofence.bootstrap_on_first_checkin);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [storage]
            path = "/var/lib/fencepost"

            [geofence]
            default_radius_m = 250.0
            bootstrap_on_first_checkin = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.path, PathBuf::from("/var/lib/fencepost"));
        assert_eq!(config.geofence.default_radius_m, 250.0);
        assert!(!config.geofence.bootstrap_on_first_checkin);
        assert_eq!(config.geocoder.batch_delay_ms, 1000);
    }

    #[test]
    fn test_rejects_negative_radius() {
        let result = Config::from_toml("[geofence]\ndefault_radius_m = -5.0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let result = Config::from_toml("[geocoder]\nbase_url = \"not a url\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fencepost.toml");
        fs::write(&path, "[server]\nlisten = \"127.0.0.1:8080\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }
}
