//! Promisify configuration parsing (promisify.toml)
//!
//! ```toml
//! [promisify]
//! suffix = "Async"
//! exclude = ["close", "destroy"]
//! include-private = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::{default_filter, is_identifier, PromisifyOptions, DEFAULT_SUFFIX};

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse JSON
    #[error("Failed to parse JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to write TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Configuration file (promisify.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromisifyConfig {
    /// Settings for promisification passes
    #[serde(default)]
    pub promisify: PromisifySettings,
}

/// The `[promisify]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PromisifySettings {
    /// Wrapper suffix (default: "Async")
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Member names that are never promisified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Also promisify members whose name starts with `_`
    #[serde(default)]
    pub include_private: bool,
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

impl Default for PromisifySettings {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            exclude: Vec::new(),
            include_private: false,
        }
    }
}

impl PromisifyConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: PromisifyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: PromisifyConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.promisify;

        if PromisifyOptions::new()
            .with_suffix(settings.suffix.as_str())
            .validate()
            .is_err()
        {
            return Err(ConfigError::ValidationError(format!(
                "suffix '{}' is not a valid identifier fragment",
                settings.suffix
            )));
        }

        for name in &settings.exclude {
            if !is_identifier(name) {
                return Err(ConfigError::ValidationError(format!(
                    "excluded member '{}' is not a valid identifier",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build pass options from this configuration.
    ///
    /// Without exclusions or private members the default filter is kept.
    pub fn into_options(self) -> Result<PromisifyOptions, ConfigError> {
        self.validate()?;
        let PromisifySettings {
            suffix,
            exclude,
            include_private,
        } = self.promisify;

        let options = PromisifyOptions::new().with_suffix(suffix);
        if exclude.is_empty() && !include_private {
            return Ok(options);
        }

        Ok(options.with_filter(move |name, value| {
            if exclude.iter().any(|excluded| excluded == name) {
                return false;
            }
            if include_private && name.starts_with('_') {
                return is_identifier(name);
            }
            default_filter(name, value)
        }))
    }
}
