//! Core error types for godo-core.
//!
//! This module defines the error hierarchy using thiserror. Only a few of
//! these ever reach a host: remote source failures are absorbed by the
//! data facade, and classifier input problems degrade to "no decision".

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for godo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Item source errors (remote or local dataset)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Neither the remote source nor the local dataset produced any items
    #[error("No event data available")]
    NoDataAvailable,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised while fetching items from a source.
///
/// The facade treats every variant as "source unavailable".
#[derive(Error, Debug)]
pub enum SourceError {
    /// The remote did not answer within the configured bound
    #[error("Remote source timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// Remote mode was selected but no remote source exists
    #[error("No remote source configured")]
    NotConfigured,

    /// Transport-level failure
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Remote source returned HTTP {status}")]
    Status { status: u16 },

    /// Payload did not have the expected shape
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Payload parsed but held no usable items
    #[error("Source returned no usable items")]
    Empty,

    /// Invalid base URL
    #[error("Invalid source URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local dataset file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
