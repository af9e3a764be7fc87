//! Per-kind resource deployers.
//!
//! Each deployer implements create-or-update for one resource kind
//! against the remote workspace. The shared contract: given the declared
//! properties and the prior physical id (if any), converge the remote
//! object and report the resulting physical id, the captured remote
//! response, and which state transition occurred. Repeated calls with
//! unchanged inputs converge to the same physical identity.

mod dbfs_object;
mod job;
mod workspace_object;

pub use dbfs_object::DbfsObjectDeployer;
pub use job::JobDeployer;
pub use workspace_object::WorkspaceObjectDeployer;

use serde_json::{Map, Value};

/// Options threaded from the top-level deploy call into every deployer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Whether existing remote content may be replaced.
    pub overwrite: bool,
}

/// The state transition a deploy call performed for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    /// No prior physical id and no remote match: a new object was created.
    Created,
    /// No prior physical id but exactly one remote object matched the
    /// declared name: it was updated and bound to this resource.
    Adopted,
    /// The prior physical id still resolved: the object was updated in
    /// place.
    Updated,
    /// The prior physical id no longer resolved (deleted out-of-band): a
    /// replacement was created.
    Recreated,
}

/// Result of deploying one resource.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Remote identifier map; opaque outside the owning deployer.
    pub physical_id: Map<String, Value>,
    /// Captured remote response from the deploy call.
    pub deploy_output: Value,
    /// Which state transition occurred.
    pub action: DeployAction,
}

impl std::fmt::Display for DeployAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            Self::Created => "created",
            Self::Adopted => "adopted",
            Self::Updated => "updated",
            Self::Recreated => "recreated",
        };
        write!(f, "{action}")
    }
}
