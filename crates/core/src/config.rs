//! Analysis configuration file: comparer thresholds plus cache lifetimes.
//!
//! Lives wherever the caller points (conventionally `mapdiff.yaml`). Every
//! section and field is optional; absent values take the documented defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::CacheOptions;
use crate::compare::CompareOptions;
use crate::diff::DiffOptions;
use crate::error::ConfigError;

/// Default file name written by `init-config`.
pub const DEFAULT_CONFIG_FILE: &str = "mapdiff.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub compare: CompareOptions,
    pub diff: DiffOptions,
    pub cache: CacheOptions,
}

impl AnalysisConfig {
    /// Load from `.json`, `.yaml`, or `.yml`, then validate every section.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let body = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        let config: AnalysisConfig = match ext.as_str() {
            "json" => serde_json::from_str(&body)
                .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?,
            "yaml" | "yml" => Self::from_yaml_str(&body)
                .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_yaml_str(body: &str) -> Result<Self, serde_yaml::Error> {
        // An empty YAML document means "all defaults".
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(body)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compare.validate()?;
        self.diff.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
