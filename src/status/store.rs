//! Status file persistence.
//!
//! The status file lives next to the stack configuration, at a path
//! derived by inserting a marker before the configuration file's
//! extension. An absent or unreadable status file is treated as "nothing
//! deployed yet" rather than an error; corruption is surfaced as a
//! warning because an operator may want to know the difference.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use serde_json::{Map, Value};

use crate::config::ResourceKind;
use crate::error::Result;

use super::types::StackStatus;

/// Marker inserted before the config file extension to derive the
/// status file name.
const STATUS_MARKER: &str = "deployed";

/// Persists and loads the deploy status for one stack configuration.
#[derive(Debug)]
pub struct StatusStore {
    /// Path to the status file, derived from the config path.
    status_path: PathBuf,
}

impl StatusStore {
    /// Creates a store for the status of the given configuration file.
    #[must_use]
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            status_path: Self::status_path_for(config_path.as_ref()),
        }
    }

    /// Derives the status file path for a configuration file path.
    ///
    /// The marker lands immediately before the final extension:
    /// `a/b.json` becomes `a/b.deployed.json` and `a/b.c.json` becomes
    /// `a/b.c.deployed.json`. A path without an extension gets the
    /// marker appended.
    #[must_use]
    pub fn status_path_for(config_path: &Path) -> PathBuf {
        let file_name = config_path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        let status_name = match file_name.rsplit_once('.') {
            Some((stem, extension)) => format!("{stem}.{STATUS_MARKER}.{extension}"),
            None => format!("{file_name}.{STATUS_MARKER}"),
        };

        config_path.with_file_name(status_name)
    }

    /// Returns the derived status file path.
    #[must_use]
    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    /// Loads the prior status, if any.
    ///
    /// Returns `None` when the file does not exist or cannot be parsed;
    /// the run proceeds as if nothing is deployed. A file that exists but
    /// is unreadable or corrupt is logged as a warning so the operator can
    /// distinguish it from a genuinely absent file.
    pub async fn load(&self) -> Option<StackStatus> {
        if !self.status_path.exists() {
            debug!(
                "Status file does not exist: {}",
                self.status_path.display()
            );
            return None;
        }

        let content = match fs::read_to_string(&self.status_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Status file {} exists but could not be read ({e}); \
                     treating stack as not deployed",
                    self.status_path.display()
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(status) => {
                info!("Loaded status from: {}", self.status_path.display());
                Some(status)
            }
            Err(e) => {
                warn!(
                    "Status file {} is corrupt ({e}); treating stack as not deployed",
                    self.status_path.display()
                );
                None
            }
        }
    }

    /// Saves the status, creating missing parent directories.
    ///
    /// Writes to a temporary file first, then renames into place, so a
    /// crash mid-write cannot leave a truncated status file.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be serialized or written.
    pub async fn save(&self, status: &StackStatus) -> Result<()> {
        if let Some(parent) = self.status_path.parent() {
            if !parent.exists() {
                debug!("Creating status directory: {}", parent.display());
                fs::create_dir_all(parent).await?;
            }
        }

        info!("Saving status to: {}", self.status_path.display());

        let content = serde_json::to_string_pretty(status)
            .map_err(|e| crate::error::LakestackError::internal(format!(
                "Failed to serialize status: {e}"
            )))?;

        let temp_path = self.status_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.status_path).await?;

        debug!("Status saved successfully");
        Ok(())
    }

    /// Looks up the recorded physical id for a resource.
    ///
    /// Returns `None` when no record exists for the id, or when the
    /// recorded kind differs from the requested kind. A resource must not
    /// silently change kind across deploys while keeping the same id, so
    /// a kind mismatch is never resolved here; the resource is treated as
    /// not yet deployed.
    #[must_use]
    pub fn lookup<'a>(
        status: Option<&'a StackStatus>,
        resource_id: &str,
        kind: ResourceKind,
    ) -> Option<&'a Map<String, Value>> {
        let record = status?.get_record(resource_id)?;

        if record.kind != kind {
            warn!(
                "Resource '{resource_id}' was deployed as {} but is now declared as {kind}; \
                 ignoring the prior physical id",
                record.kind
            );
            return None;
        }

        Some(&record.physical_id)
    }
}
