//! Station configuration
//!
//! Loaded from YAML. Every field has a default so an empty file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;

/// Default listener count above which a registry logs a warning
pub const DEFAULT_LISTENER_WARN_THRESHOLD: usize = 64;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StationConfig {
    /// Name used in log fields
    #[serde(default = "default_name")]
    pub name: String,
    /// Warn once when a registry grows past this many listeners
    #[serde(default = "default_listener_warn_threshold")]
    pub listener_warn_threshold: usize,
    /// Initial state for JSON-object stations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Map<String, Value>>,
}

impl StationConfig {
    /// Config with a custom name and defaults elsewhere
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to load config: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // serde_yaml maps an empty document to unit, not to an empty mapping
        let config: StationConfig = if contents.trim().is_empty() {
            StationConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Station name cannot be empty");
        }
        if self.listener_warn_threshold == 0 {
            anyhow::bail!("listener_warn_threshold must be at least 1");
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            listener_warn_threshold: default_listener_warn_threshold(),
            initial_state: None,
        }
    }
}

fn default_name() -> String { "station".to_string() }
fn default_listener_warn_threshold() -> usize { DEFAULT_LISTENER_WARN_THRESHOLD }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = StationConfig::from_yaml("").unwrap();
        assert_eq!(config, StationConfig::default());
        assert_eq!(config.name, "station");
        assert_eq!(config.listener_warn_threshold, DEFAULT_LISTENER_WARN_THRESHOLD);
    }

    #[test]
    fn test_parse_full_document() {
        let config = StationConfig::from_yaml(
            r#"
name: "counter"
listener_warn_threshold: 8
initial_state:
  count: 0
  label: "clicks"
"#,
        )
        .unwrap();

        assert_eq!(config.name, "counter");
        assert_eq!(config.listener_warn_threshold, 8);
        assert_eq!(
            Value::Object(config.initial_state.unwrap()),
            json!({"count": 0, "label": "clicks"})
        );
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let err = StationConfig::from_yaml("name: \"  \"").unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        assert!(StationConfig::from_yaml("listener_warn_threshold: 0").is_err());
    }

    #[test]
    fn test_initial_state_must_be_object() {
        assert!(StationConfig::from_yaml("initial_state: [1, 2]").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), "name: \"from-disk\"\n")?;

        let config = StationConfig::load(&file.path().to_string_lossy()).await?;
        assert_eq!(config.name, "from-disk");

        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = StationConfig::load("/nonexistent/station.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
