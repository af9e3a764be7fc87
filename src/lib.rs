// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![cfg_attr(not(test), deny(missing_docs))] // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Lakestack
//!
//! A declarative, idempotent stack deployment engine for data workspace
//! resources: jobs, workspace notebooks and directories, and DBFS blobs.
//!
//! ## Overview
//!
//! Lakestack reads a stack configuration, creates or updates the remote
//! object behind every declared resource, and persists the mapping from
//! declared resources to remote (physical) identifiers so repeated runs
//! converge instead of duplicating:
//!
//! - A recorded physical id that still resolves is updated in place.
//! - A recorded physical id that was deleted out-of-band is recreated.
//! - A job with no recorded id adopts the single remote job with its
//!   declared name, and refuses to guess when several match.
//!
//! ## Modules
//!
//! - [`config`]: Stack configuration parsing and validation
//! - [`status`]: Persistence of deployed physical identifiers
//! - [`api`]: Workspace API client and service traits
//! - [`deploy`]: Per-kind resource deployers
//! - [`reconciler`]: The end-to-end deploy operation
//! - [`cwd`]: Scoped working-directory redirection
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```json
//! {
//!   "name": "analytics",
//!   "resources": [
//!     {
//!       "id": "nightly-job",
//!       "kind": "JOB",
//!       "properties": {"name": "analytics-nightly"}
//!     },
//!     {
//!       "id": "etl-notebook",
//!       "kind": "WORKSPACE_OBJECT",
//!       "properties": {
//!         "source_path": "notebooks/etl.py",
//!         "path": "/Shared/analytics/etl",
//!         "object_type": "NOTEBOOK"
//!       }
//!     }
//!   ]
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod cli;
pub mod config;
pub mod cwd;
pub mod deploy;
pub mod error;
pub mod reconciler;
pub mod status;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{ApiConfig, DbfsService, JobService, WorkspaceClient, WorkspaceService};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, Resource, ResourceKind, StackConfig};
pub use cwd::WorkingDirectoryScope;
pub use deploy::{
    DbfsObjectDeployer, DeployAction, DeployOptions, DeployOutcome, JobDeployer,
    WorkspaceObjectDeployer,
};
pub use error::{ApiError, ConfigError, DeployError, LakestackError, Result};
pub use reconciler::Reconciler;
pub use status::{DeployedResourceRecord, StackStatus, StatusStore};
