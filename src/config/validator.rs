//! Stack configuration validation.
//!
//! This module checks the structural invariants a parsed configuration
//! must hold before any remote call is made: resource ids are unique and
//! non-empty, and each resource carries the properties its deployer
//! requires.

use crate::error::{ConfigError, LakestackError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{Resource, ResourceKind, StackConfig};

/// Validator for stack configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a stack configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource id is duplicated or any other
    /// structural check fails.
    pub fn validate(&self, config: &StackConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        if config.name.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("name"),
                message: String::from("Stack name cannot be empty"),
            });
        }

        // Resource ids must be unique; reconciliation is keyed on them.
        let mut seen = HashSet::new();
        for resource in &config.resources {
            if !seen.insert(resource.id.as_str()) {
                return Err(LakestackError::Config(ConfigError::DuplicateId {
                    id: resource.id.clone(),
                }));
            }
        }

        for (index, resource) in config.resources.iter().enumerate() {
            Self::validate_resource(index, resource, &mut result);
        }

        if result.errors.is_empty() {
            debug!("Stack configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(LakestackError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates a single resource declaration.
    fn validate_resource(index: usize, resource: &Resource, result: &mut ValidationResult) {
        let field_prefix = format!("resources[{index}]");

        if resource.id.is_empty() {
            result.errors.push(ValidationError {
                field: format!("{field_prefix}.id"),
                message: String::from("Resource id cannot be empty"),
            });
        }

        let required: &[&str] = match resource.kind {
            ResourceKind::Job => &["name"],
            ResourceKind::WorkspaceObject => &["path", "source_path", "object_type"],
            ResourceKind::DbfsObject => &["path", "source_path"],
        };

        for key in required {
            if resource.property_str(key).is_none() {
                result.errors.push(ValidationError {
                    field: format!("{field_prefix}.properties.{key}"),
                    message: format!(
                        "Resource '{}' of kind {} requires a string property '{key}'",
                        resource.id, resource.kind
                    ),
                });
            }
        }

        if resource.kind == ResourceKind::WorkspaceObject {
            if let Some(object_type) = resource.property_str("object_type") {
                if object_type != "NOTEBOOK" && object_type != "DIRECTORY" {
                    result.errors.push(ValidationError {
                        field: format!("{field_prefix}.properties.object_type"),
                        message: format!(
                            "object_type must be NOTEBOOK or DIRECTORY, got '{object_type}'"
                        ),
                    });
                }
            }
        }

        if resource.kind == ResourceKind::DbfsObject {
            if let Some(value) = resource.properties.get("is_dir") {
                if !value.is_boolean() {
                    result.errors.push(ValidationError {
                        field: format!("{field_prefix}.properties.is_dir"),
                        message: String::from("is_dir must be a boolean"),
                    });
                }
            }
        }
    }
}
