//! DBFS blob-storage service surface.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, LakestackError, Result};

use super::client::WorkspaceClient;

/// Metadata for one DBFS entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute DBFS path.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// File size in bytes (zero for directories).
    #[serde(default)]
    pub file_size: u64,
}

/// Remote operations on DBFS blob storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DbfsService: Send + Sync {
    /// Uploads a single file.
    async fn put(&self, path: &str, contents: &[u8], overwrite: bool) -> Result<()>;

    /// Creates a directory (and any missing parents).
    async fn mkdirs(&self, path: &str) -> Result<()>;

    /// Fetches metadata for a path.
    ///
    /// Fails with a not-found error if nothing exists at the path.
    async fn get_status(&self, path: &str) -> Result<FileInfo>;
}

#[async_trait]
impl DbfsService for WorkspaceClient {
    async fn put(&self, path: &str, contents: &[u8], overwrite: bool) -> Result<()> {
        let body = json!({
            "path": path,
            "contents": BASE64.encode(contents),
            "overwrite": overwrite,
        });
        let _: Value = self.post_json("dbfs/put", &body).await?;
        Ok(())
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let body = json!({ "path": path });
        let _: Value = self.post_json("dbfs/mkdirs", &body).await?;
        Ok(())
    }

    async fn get_status(&self, path: &str) -> Result<FileInfo> {
        let query = [("path", path.to_string())];
        self.get_json("dbfs/get-status", &query)
            .await
            .map_err(|e| match e {
                LakestackError::Api(ApiError::NotFound { .. }) => {
                    LakestackError::Api(ApiError::not_found(path))
                }
                other => other,
            })
    }
}
