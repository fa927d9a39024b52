use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use query::compiler::QueryLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use viewport::controller::{ViewportSettings, MIN_BBOX_ZOOM};
use viewport::map::FlyToParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("environment variable {key}={value:?} is not a valid value")]
    InvalidEnv { key: String, value: String },
}

/// Tunables of a browsing session.
///
/// Layered as defaults, then an optional JSON file, then `EVENTMAP_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub dataset_path: String,
    pub viewport_debounce_ms: u64,
    pub autocomplete_debounce_ms: u64,
    pub search_debounce_ms: u64,
    pub slider_debounce_ms: u64,
    pub min_bbox_zoom: f64,
    pub min_prefix_chars: usize,
    pub suggestion_limit: usize,
    pub limits: QueryLimits,
    pub fly_to: FlyToParams,
    pub camera_sync: bool,
    pub bbox_sync: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            dataset_path: "final_enriched.parquet".to_string(),
            viewport_debounce_ms: 500,
            autocomplete_debounce_ms: 150,
            search_debounce_ms: 300,
            slider_debounce_ms: 300,
            min_bbox_zoom: MIN_BBOX_ZOOM,
            min_prefix_chars: 2,
            suggestion_limit: 10,
            limits: QueryLimits::default(),
            fly_to: FlyToParams::default(),
            camera_sync: true,
            bbox_sync: true,
        }
    }
}

impl BrowserConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            dataset_path: env::var("EVENTMAP_DATASET").unwrap_or(self.dataset_path),
            viewport_debounce_ms: env_var_u64("EVENTMAP_VIEWPORT_DEBOUNCE_MS", self.viewport_debounce_ms)?,
            autocomplete_debounce_ms: env_var_u64(
                "EVENTMAP_AUTOCOMPLETE_DEBOUNCE_MS",
                self.autocomplete_debounce_ms,
            )?,
            search_debounce_ms: env_var_u64("EVENTMAP_SEARCH_DEBOUNCE_MS", self.search_debounce_ms)?,
            slider_debounce_ms: env_var_u64("EVENTMAP_SLIDER_DEBOUNCE_MS", self.slider_debounce_ms)?,
            min_bbox_zoom: env_var_f64("EVENTMAP_MIN_BBOX_ZOOM", self.min_bbox_zoom)?,
            min_prefix_chars: env_var_usize("EVENTMAP_MIN_PREFIX_CHARS", self.min_prefix_chars)?,
            suggestion_limit: env_var_usize("EVENTMAP_SUGGESTION_LIMIT", self.suggestion_limit)?,
            limits: QueryLimits {
                browse: env_var_usize("EVENTMAP_BROWSE_LIMIT", self.limits.browse)?,
                search: env_var_usize("EVENTMAP_SEARCH_LIMIT", self.limits.search)?,
            },
            fly_to: self.fly_to,
            camera_sync: env_var_bool("EVENTMAP_CAMERA_SYNC", self.camera_sync)?,
            bbox_sync: env_var_bool("EVENTMAP_BBOX_SYNC", self.bbox_sync)?,
        })
    }

    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            debounce: Duration::from_millis(self.viewport_debounce_ms),
            min_zoom: self.min_bbox_zoom,
            fly: self.fly_to,
            camera_sync: self.camera_sync,
            bbox_sync: self.bbox_sync,
        }
    }

    pub fn autocomplete_debounce(&self) -> Duration {
        Duration::from_millis(self.autocomplete_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn slider_debounce(&self) -> Duration {
        Duration::from_millis(self.slider_debounce_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn env_var_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    env_parse(key, default)
}

fn env_var_usize(key: &str, default: usize) -> Result<usize, ConfigError> {
    env_parse(key, default)
}

fn env_var_f64(key: &str, default: f64) -> Result<f64, ConfigError> {
    env_parse(key, default)
}

fn env_var_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidEnv {
                key: key.to_string(),
                value,
            }),
        },
        Err(_) => Ok(default),
    }
}
