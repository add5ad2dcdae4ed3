use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinates;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_CITY: &str = "New York";
pub const API_KEY_ENV: &str = "WEATHERAPI_KEY";

/// Fixed home coordinates used instead of a device location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub lat: f64,
    pub lon: f64,
}

impl From<HomeLocation> for Coordinates {
    fn from(home: HomeLocation) -> Self {
        Coordinates::new(home.lat, home.lon)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "New York"
///
/// [home]
/// lat = 40.71
/// lon = -74.01
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// City fetched when location permission is denied.
    #[serde(default = "default_city")]
    pub default_city: String,

    #[serde(default)]
    pub home: Option<HomeLocation>,

    /// Overrides the platform data directory holding the local store.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_city: default_city(),
            home: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// `WEATHERAPI_KEY` in the environment takes precedence over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            // First run: no config file.
            Self::default()
        };

        cfg.apply_env_key(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weathertoday", "weathertoday")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the local key-value store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Returns the API key, or an error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured for WeatherAPI.com.\n\
                     Hint: run `weathertoday configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn home_coordinates(&self) -> Option<Coordinates> {
        self.home.map(Coordinates::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_weatherapi_and_new_york() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.default_city, "New York");
        assert!(cfg.home.is_none());
    }

    #[test]
    fn missing_api_key_errors_with_hint() {
        let cfg = Config::default();
        let err = cfg.require_api_key().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `weathertoday configure`"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config { api_key: Some("  ".into()), ..Config::default() };
        assert!(cfg.require_api_key().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml("api_key = \"KEY\"\n").expect("valid toml");
        assert_eq!(cfg.require_api_key().unwrap(), "KEY");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.default_city, DEFAULT_CITY);
    }

    #[test]
    fn home_section_parses_into_coordinates() {
        let cfg = Config::from_toml("[home]\nlat = 40.7\nlon = -74.0\n").expect("valid toml");
        assert_eq!(cfg.home_coordinates(), Some(Coordinates::new(40.7, -74.0)));
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let mut cfg = Config { api_key: Some("FILE".into()), ..Config::default() };
        cfg.apply_env_key(Some("ENV".into()));
        assert_eq!(cfg.api_key.as_deref(), Some("ENV"));

        cfg.apply_env_key(Some(String::new()));
        assert_eq!(cfg.api_key.as_deref(), Some("ENV"));

        cfg.apply_env_key(None);
        assert_eq!(cfg.api_key.as_deref(), Some("ENV"));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cfg = Config { data_dir: Some(PathBuf::from("/tmp/wt")), ..Config::default() };
        assert_eq!(cfg.data_dir().unwrap(), PathBuf::from("/tmp/wt"));
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            home: Some(HomeLocation { lat: 51.5, lon: -0.12 }),
            ..Config::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.api_key, cfg.api_key);
        assert_eq!(back.home, cfg.home);
        assert_eq!(back.default_city, cfg.default_city);
    }
}
