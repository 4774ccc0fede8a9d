//! Error types for the fallible edges of the core.
//!
//! Parsing and comparing never fail (malformed input degrades to partial
//! results). Errors only arise when options are validated at the boundary,
//! when a config file is loaded, or when the cache sweeper thread is spawned.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected option values. Raised by `validate()` on the options structs.
#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    /// Threshold was NaN, infinite, or negative.
    #[error("Invalid value for '{field}': {value} (must be a finite, non-negative number)")]
    InvalidThreshold { field: &'static str, value: f64 },

    /// `topN` must select at least one entry.
    #[error("Invalid value for 'topN': must be at least 1")]
    ZeroTopN,

    /// Cache TTL or sweep interval of zero.
    #[error("Invalid value for '{0}': duration must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Failure to load an analysis config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse YAML config at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported config format '{0}'; expected .json, .yaml, or .yml")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Invalid(#[from] OptionsError),
}

/// Error type for cache lifecycle operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The background sweep thread could not be spawned.
    #[error("Failed to spawn cache sweeper thread: {0}")]
    SpawnSweeper(#[from] std::io::Error),
}
