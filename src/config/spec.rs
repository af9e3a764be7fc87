//! Stack configuration types.
//!
//! This module defines the structs that map to a stack configuration file.
//! A stack is a named, ordered collection of resource declarations; each
//! resource carries a kind discriminant and a kind-specific property map
//! that is opaque to everything except the matching deployer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The root configuration structure for one stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackConfig {
    /// Unique name for the stack.
    pub name: String,
    /// Resources to deploy, in declaration order.
    pub resources: Vec<Resource>,
}

/// A single declared resource within a stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Stack-local identifier; reconciliation is keyed on this.
    pub id: String,
    /// Resource kind discriminant. Accepts `service` as a field alias.
    #[serde(alias = "service")]
    pub kind: ResourceKind,
    /// Kind-specific properties, passed through to the deployer.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Resource kinds supported by the deployment engine.
///
/// Adding a kind means adding a variant here, a deployer for it, and a
/// dispatch arm in the reconciler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// A scheduled or on-demand job.
    Job,
    /// A notebook or directory in the workspace tree.
    WorkspaceObject,
    /// A file or directory in DBFS blob storage.
    DbfsObject,
}

impl Resource {
    /// Returns a string-valued property, if present.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Returns a bool-valued property, if present.
    #[must_use]
    pub fn property_bool(&self, key: &str) -> Option<bool> {
        self.properties.get(key).and_then(Value::as_bool)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Job => "JOB",
            Self::WorkspaceObject => "WORKSPACE_OBJECT",
            Self::DbfsObject => "DBFS_OBJECT",
        };
        write!(f, "{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            ResourceKind::Job,
            ResourceKind::WorkspaceObject,
            ResourceKind::DbfsObject,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ResourceKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }

    #[test]
    fn test_service_alias() {
        let resource: Resource = serde_json::from_str(
            r#"{"id": "r1", "service": "JOB", "properties": {"name": "nightly"}}"#,
        )
        .unwrap();
        assert_eq!(resource.kind, ResourceKind::Job);
        assert_eq!(resource.property_str("name"), Some("nightly"));
    }
}
