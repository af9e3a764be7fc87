//! Workspace-tree service surface.
//!
//! Notebooks and directories live in a path-addressed tree; import and
//! export carry base64-encoded content so notebook sources survive the
//! JSON wire format intact.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, LakestackError, Result};

use super::client::WorkspaceClient;

/// Metadata for one object in the workspace tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Absolute workspace path.
    pub path: String,
    /// Object type (`NOTEBOOK` or `DIRECTORY`).
    pub object_type: String,
    /// Notebook language, when applicable.
    #[serde(default)]
    pub language: Option<String>,
}

/// Request to import one object into the workspace tree.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Absolute workspace destination path.
    pub path: String,
    /// Raw object content.
    pub content: Vec<u8>,
    /// Notebook language, when applicable.
    pub language: Option<String>,
    /// Import format (defaults to `SOURCE` remotely when absent).
    pub format: Option<String>,
    /// Whether existing remote content may be replaced.
    pub overwrite: bool,
}

/// Remote operations on the workspace tree.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkspaceService: Send + Sync {
    /// Imports a single object.
    async fn import(&self, request: &ImportRequest) -> Result<()>;

    /// Exports a single object's content.
    async fn export(&self, path: &str) -> Result<Vec<u8>>;

    /// Creates a directory (and any missing parents).
    async fn mkdirs(&self, path: &str) -> Result<()>;

    /// Lists the immediate children of a directory.
    async fn list(&self, path: &str) -> Result<Vec<ObjectInfo>>;

    /// Fetches metadata for a path.
    ///
    /// Fails with a not-found error if nothing exists at the path.
    async fn get_status(&self, path: &str) -> Result<ObjectInfo>;
}

#[async_trait]
impl WorkspaceService for WorkspaceClient {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        let mut body = json!({
            "path": request.path,
            "content": BASE64.encode(&request.content),
            "overwrite": request.overwrite,
        });
        if let Some(language) = &request.language {
            body["language"] = json!(language);
        }
        if let Some(format) = &request.format {
            body["format"] = json!(format);
        }

        let _: Value = self.post_json("workspace/import", &body).await?;
        Ok(())
    }

    async fn export(&self, path: &str) -> Result<Vec<u8>> {
        #[derive(Deserialize)]
        struct Response {
            content: String,
        }

        let query = [("path", path.to_string())];
        let response: Response = self.get_json("workspace/export", &query).await?;

        BASE64.decode(&response.content).map_err(|e| {
            LakestackError::Api(ApiError::InvalidResponse {
                message: format!("Exported content is not valid base64: {e}"),
            })
        })
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let body = json!({ "path": path });
        let _: Value = self.post_json("workspace/mkdirs", &body).await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            objects: Vec<ObjectInfo>,
        }

        let query = [("path", path.to_string())];
        let response: Response = self.get_json("workspace/list", &query).await?;
        Ok(response.objects)
    }

    async fn get_status(&self, path: &str) -> Result<ObjectInfo> {
        let query = [("path", path.to_string())];
        self.get_json("workspace/get-status", &query)
            .await
            .map_err(|e| match e {
                LakestackError::Api(ApiError::NotFound { .. }) => {
                    LakestackError::Api(ApiError::not_found(path))
                }
                other => other,
            })
    }
}
