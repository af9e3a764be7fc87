//! Stack configuration parser.
//!
//! This module handles loading a stack configuration from a JSON file with
//! proper error mapping. Parsing has no side effects beyond reading the
//! file; the configuration is immutable once loaded for a run.

use crate::error::{ConfigError, LakestackError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::StackConfig;

/// Parser for stack configuration files.
#[derive(Debug, Default)]
pub struct ConfigParser;

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a stack configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read, or is not
    /// a valid stack configuration.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<StackConfig> {
        let path = path.as_ref();
        info!("Loading stack configuration from: {}", path.display());

        if !path.exists() {
            return Err(LakestackError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            LakestackError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_json(&content, Some(path))
    }

    /// Parses a stack configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or lacks required fields
    /// (including `resources`).
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<StackConfig> {
        debug!("Parsing stack configuration");

        let config: StackConfig = serde_json::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            LakestackError::Config(ConfigError::ParseError {
                message: format!("JSON parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed stack '{}' with {} resources",
            config.name,
            config.resources.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceKind;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{"name": "empty-stack", "resources": []}"#;
        let config = ConfigParser::new().parse_json(json, None).unwrap();
        assert_eq!(config.name, "empty-stack");
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"
        {
            "name": "analytics",
            "resources": [
                {
                    "id": "nightly-job",
                    "kind": "JOB",
                    "properties": {
                        "name": "analytics-nightly",
                        "schedule": {"quartz_cron_expression": "0 0 2 * * ?"}
                    }
                },
                {
                    "id": "etl-notebook",
                    "kind": "WORKSPACE_OBJECT",
                    "properties": {
                        "source_path": "notebooks/etl.py",
                        "path": "/Shared/analytics/etl",
                        "object_type": "NOTEBOOK"
                    }
                },
                {
                    "id": "seed-data",
                    "kind": "DBFS_OBJECT",
                    "properties": {
                        "source_path": "data/seed.csv",
                        "path": "dbfs:/analytics/seed.csv",
                        "is_dir": false
                    }
                }
            ]
        }"#;
        let config = ConfigParser::new().parse_json(json, None).unwrap();
        assert_eq!(config.name, "analytics");
        assert_eq!(config.resources.len(), 3);
        assert_eq!(config.resources[0].kind, ResourceKind::Job);
        assert_eq!(config.resources[1].kind, ResourceKind::WorkspaceObject);
        assert_eq!(config.resources[2].kind, ResourceKind::DbfsObject);
    }

    #[test]
    fn test_missing_resources_field_is_parse_error() {
        let json = r#"{"name": "no-resources"}"#;
        let result = ConfigParser::new().parse_json(json, None);
        assert!(matches!(
            result,
            Err(LakestackError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigParser::new().load_file("/nonexistent/stack.json");
        assert!(matches!(
            result,
            Err(LakestackError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
