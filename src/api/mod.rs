//! Workspace API integration module.
//!
//! This module provides the HTTP client for the remote workspace and the
//! three service traits the deployers consume: jobs, workspace tree, and
//! DBFS blob storage. The traits are the seams mocked in tests.

mod client;
mod dbfs;
mod jobs;
mod workspace;

pub use client::{ApiConfig, WorkspaceClient};
pub use dbfs::{DbfsService, FileInfo};
pub use jobs::{Job, JobService};
pub use workspace::{ImportRequest, ObjectInfo, WorkspaceService};

#[cfg(test)]
pub use dbfs::MockDbfsService;
#[cfg(test)]
pub use jobs::MockJobService;
#[cfg(test)]
pub use workspace::MockWorkspaceService;
