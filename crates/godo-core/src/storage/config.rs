//! TOML-based application configuration.
//!
//! Stores:
//! - Data source selection (remote endpoint, mock mode, timeouts, cache)
//! - Gesture thresholds and the exit-animation settle delay
//! - Logging level and format
//!
//! Configuration is stored at `~/.config/godo/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::gesture::Thresholds;

/// Item source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub remote_enabled: bool,
    /// Forces the bundled dataset regardless of `remote_enabled`.
    #[serde(default = "default_true")]
    pub mock_mode: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Path to a JSON dataset replacing the bundled one. Empty = bundled.
    #[serde(default)]
    pub local_dataset_path: String,
    /// Mirror committed decisions to the remote swipes endpoint.
    #[serde(default)]
    pub mirror_decisions: bool,
}

/// Gesture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_provisional_distance")]
    pub provisional_distance: f64,
    #[serde(default = "default_commit_distance")]
    pub commit_distance: f64,
    #[serde(default = "default_commit_velocity")]
    pub commit_velocity: f64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/godo/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://localhost:8000/api/v1".into()
}
fn default_timeout_secs() -> u64 {
    8
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_provisional_distance() -> f64 {
    50.0
}
fn default_commit_distance() -> f64 {
    80.0
}
fn default_commit_velocity() -> f64 {
    500.0
}
fn default_settle_delay_ms() -> u64 {
    250
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            mock_mode: true,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            local_dataset_path: String::new(),
            mirror_decisions: false,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            provisional_distance: default_provisional_distance(),
            commit_distance: default_commit_distance(),
            commit_velocity: default_commit_velocity(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DataConfig {
    /// Remote mode is used only when enabled and not in mock mode.
    pub fn use_remote(&self) -> bool {
        self.remote_enabled && !self.mock_mode
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn local_dataset_path(&self) -> Option<PathBuf> {
        let trimmed = self.local_dataset_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

impl GestureConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            provisional_distance: self.provisional_distance,
            commit_distance: self.commit_distance,
            commit_velocity: self.commit_velocity,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(n) if n.is_u64() => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                serde_json::Value::Number(_) => value
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gesture
            .thresholds()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "gesture".into(),
                message: e.to_string(),
            })?;
        url::Url::parse(&self.data.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "data.base_url".into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid. `self` is left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
