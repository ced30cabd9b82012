mod config;

pub use config::{Config, DataConfig, GestureConfig, LoggingConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Godo data directory, creating it if needed.
///
/// `GODO_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/godo/`, or `~/.config/godo-dev/` when `GODO_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("GODO_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GODO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("godo-dev")
            } else {
                base_dir.join("godo")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
