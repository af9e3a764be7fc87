//! Status persistence module for the lakestack deployment engine.
//!
//! This module records which declared resources map to which remote
//! (physical) identifiers, so repeated deploy runs are idempotent.

mod store;
mod types;

pub use store::StatusStore;
pub use types::{DeployedResourceRecord, StackStatus, TOOL_VERSION};
