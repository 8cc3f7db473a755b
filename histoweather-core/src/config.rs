use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::router::HISTORICAL_LAG_DAYS;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

/// Base URLs of the upstream services.
///
/// Current conditions and forecasts share one physical endpoint upstream but
/// are kept separate so either can be redirected on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub historical: String,
    pub forecast: String,
    pub current: String,
    pub geocoding_search: String,
    pub geocoding_get: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            historical: "https://archive-api.open-meteo.com/v1/archive".into(),
            forecast: "https://api.open-meteo.com/v1/forecast".into(),
            current: "https://api.open-meteo.com/v1/forecast".into(),
            geocoding_search: "https://geocoding-api.open-meteo.com/v1/search".into(),
            geocoding_get: "https://geocoding-api.open-meteo.com/v1/get".into(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at `base`, for pointing the engine at a mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            historical: format!("{base}/v1/archive"),
            forecast: format!("{base}/v1/forecast"),
            current: format!("{base}/v1/forecast"),
            geocoding_search: format!("{base}/v1/search"),
            geocoding_get: format!("{base}/v1/get"),
        }
    }
}

/// Engine configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// fetch_timeout_ms = 8000
///
/// [endpoints]
/// forecast = "https://example.org/v1/forecast"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    /// Budget for one location/date pair, in milliseconds.
    pub fetch_timeout_ms: u64,
    pub historical_lag_days: u64,
    pub geocoding_result_count: u8,
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            historical_lag_days: HISTORICAL_LAG_DAYS,
            geocoding_result_count: 10,
            language: "en".into(),
        }
    }
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "histoweather", "histoweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
