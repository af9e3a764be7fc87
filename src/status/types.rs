//! Status types for tracking deployed resources.
//!
//! These types record the mapping from declared resources to the remote
//! (physical) identifiers produced by their deployers. The status file is
//! the sole local source of truth for "already deployed".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{Resource, ResourceKind};

/// Version of the tool that wrote the status file.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The persisted record of one fully-successful deploy run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackStatus {
    /// Stack name.
    pub name: String,
    /// Version of the tool that wrote this status.
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
    /// Verbatim copy of the resources deployed this run.
    pub resources: Vec<Resource>,
    /// One record per successfully deployed resource.
    pub deployed: Vec<DeployedResourceRecord>,
}

/// The record of one successfully deployed resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployedResourceRecord {
    /// Stack-local resource id.
    pub id: String,
    /// Resource kind at deploy time.
    pub kind: ResourceKind,
    /// Remote identifier map; opaque outside the owning deployer.
    pub physical_id: Map<String, Value>,
    /// Captured remote response from the deploy call.
    pub deploy_output: Value,
    /// When the resource was deployed, as epoch seconds.
    #[serde(rename = "timestamp", with = "chrono::serde::ts_seconds")]
    pub deployed_at: DateTime<Utc>,
}

impl StackStatus {
    /// Creates a new empty status for a stack.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool_version: TOOL_VERSION.to_string(),
            resources: Vec::new(),
            deployed: Vec::new(),
        }
    }

    /// Returns the deployed record for a resource id, if any.
    #[must_use]
    pub fn get_record(&self, resource_id: &str) -> Option<&DeployedResourceRecord> {
        self.deployed.iter().find(|r| r.id == resource_id)
    }

    /// Appends a record for a successfully deployed resource.
    pub fn add_record(&mut self, record: DeployedResourceRecord) {
        self.deployed.push(record);
    }
}

impl DeployedResourceRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: ResourceKind,
        physical_id: Map<String, Value>,
        deploy_output: Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            physical_id,
            deploy_output,
            deployed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serializes_as_number() {
        let record = DeployedResourceRecord::new(
            "r1",
            ResourceKind::Job,
            Map::new(),
            Value::Null,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["timestamp"].is_number());
    }

    #[test]
    fn test_get_record() {
        let mut status = StackStatus::new("s");
        status.add_record(DeployedResourceRecord::new(
            "r1",
            ResourceKind::Job,
            Map::new(),
            Value::Null,
        ));
        assert!(status.get_record("r1").is_some());
        assert!(status.get_record("r2").is_none());
    }
}
