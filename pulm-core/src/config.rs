//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Conversion settings, matching the pulm.yml schema.
///
/// Every field has a default so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConvertConfig {
    #[serde(default)]
    pub ids: IdConfig,

    #[serde(default)]
    pub tables: TableConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdConfig {
    /// Fresh candidates drawn before falling back to a placeholder id
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

fn default_retry_limit() -> u32 {
    8
}

fn default_placeholder_prefix() -> String {
    String::from("placeholder")
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            placeholder_prefix: default_placeholder_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Accept pipe-delimited table content written before the JSON layout
    #[serde(default = "default_true")]
    pub parse_legacy: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            parse_legacy: default_true(),
        }
    }
}

impl ConvertConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        // serde_yaml reads an empty document as unit, not as an empty map
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ConvertConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ids.placeholder_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ids.placeholder_prefix".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get a nested config value using dotted path (e.g., "ids.retry_limit")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["ids", "retry_limit"] => Some(self.ids.retry_limit.to_string()),
            ["ids", "placeholder_prefix"] => Some(self.ids.placeholder_prefix.clone()),
            ["tables", "parse_legacy"] => Some(self.tables.parse_legacy.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ConvertConfig::default();

        assert_eq!(config.ids.retry_limit, 8);
        assert_eq!(config.ids.placeholder_prefix, "placeholder");
        assert!(config.tables.parse_legacy);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ConvertConfig::from_yaml_str("ids:\n  retry_limit: 3\n").unwrap();

        assert_eq!(config.ids.retry_limit, 3);
        assert_eq!(config.ids.placeholder_prefix, "placeholder");
        assert!(config.tables.parse_legacy);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = ConvertConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(config, ConvertConfig::default());
    }

    #[test]
    fn test_rejects_blank_placeholder_prefix() {
        let err = ConvertConfig::from_yaml_str("ids:\n  placeholder_prefix: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulm.yml");
        std::fs::write(&path, "tables:\n  parse_legacy: false\n").unwrap();

        let config = ConvertConfig::from_file(&path).unwrap();
        assert!(!config.tables.parse_legacy);
    }

    #[test]
    fn test_get_nested_value() {
        let config = ConvertConfig::default();

        assert_eq!(config.get("ids.retry_limit"), Some("8".into()));
        assert_eq!(config.get("tables.parse_legacy"), Some("true".into()));
        assert_eq!(config.get("nonexistent.key"), None);
    }
}
