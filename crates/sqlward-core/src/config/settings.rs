//! Tunables for the parameter rule engine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Settings consumed by the built-in validation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Bindings below this confidence draw a `Confidence.Low` warning.
    #[serde(default = "default_confidence_threshold")]
    pub low_confidence_threshold: f64,

    /// String values longer than this draw a `Format.StringLength` warning.
    #[serde(default = "default_max_string_length")]
    pub max_string_length: usize,

    /// Case-insensitive substrings flagged by `Content.Inappropriate`.
    #[serde(default)]
    pub blocked_terms: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            low_confidence_threshold: default_confidence_threshold(),
            max_string_length: default_max_string_length(),
            blocked_terms: Vec::new(),
        }
    }
}

impl ValidationSettings {
    /// Load settings from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_max_string_length() -> usize {
    4000
}
