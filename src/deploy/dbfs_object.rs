//! DBFS object deployer.
//!
//! Like workspace objects, DBFS entries are addressed by their declared
//! remote path; deploying copies the local source there. The declared
//! `is_dir` flag must agree with the local filesystem before any remote
//! call is made.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::fs;
use tracing::info;

use crate::api::DbfsService;
use crate::error::{DeployError, LakestackError, Result};

use super::{DeployAction, DeployOptions, DeployOutcome};

/// Typed view of a DBFS_OBJECT resource's properties.
#[derive(Debug, Deserialize)]
struct DbfsObjectProperties {
    /// Absolute DBFS destination path.
    path: String,
    /// Local source path, resolved against the config directory.
    source_path: String,
    /// Whether the source is a directory copied recursively.
    #[serde(default)]
    is_dir: bool,
}

/// Deploys DBFS_OBJECT resources.
pub struct DbfsObjectDeployer {
    /// DBFS service client.
    dbfs: Arc<dyn DbfsService>,
}

impl DbfsObjectDeployer {
    /// Creates a new DBFS object deployer.
    #[must_use]
    pub fn new(dbfs: Arc<dyn DbfsService>) -> Self {
        Self { dbfs }
    }

    /// Copies the local source to the declared DBFS path.
    ///
    /// # Errors
    ///
    /// Fails if the properties are malformed, the local source is missing
    /// or disagrees with the declared shape, or a remote call fails.
    pub async fn deploy(
        &self,
        resource_id: &str,
        properties: &Map<String, Value>,
        prior_physical_id: Option<&Map<String, Value>>,
        options: &DeployOptions,
    ) -> Result<DeployOutcome> {
        let props: DbfsObjectProperties =
            serde_json::from_value(Value::Object(properties.clone())).map_err(|e| {
                LakestackError::Deploy(DeployError::invalid_properties(
                    resource_id,
                    e.to_string(),
                ))
            })?;

        let source = PathBuf::from(&props.source_path);
        let metadata = fs::metadata(&source).await.map_err(|_| {
            LakestackError::Deploy(DeployError::SourceNotFound {
                path: source.clone(),
            })
        })?;

        if props.is_dir && !metadata.is_dir() {
            return Err(LakestackError::Deploy(DeployError::TypeMismatch {
                path: source,
                declared: String::from("directory"),
                actual: String::from("file"),
            }));
        }
        if !props.is_dir && metadata.is_dir() {
            return Err(LakestackError::Deploy(DeployError::TypeMismatch {
                path: source,
                declared: String::from("file"),
                actual: String::from("directory"),
            }));
        }

        if props.is_dir {
            self.copy_directory(&source, &props.path, options).await?;
        } else {
            self.copy_file(&source, &props.path, options).await?;
        }

        let info = self.dbfs.get_status(&props.path).await?;

        let mut physical_id = Map::new();
        physical_id.insert(String::from("path"), json!(props.path));

        let action = if prior_physical_id.is_some() {
            DeployAction::Updated
        } else {
            DeployAction::Created
        };

        Ok(DeployOutcome {
            physical_id,
            deploy_output: serde_json::to_value(info)
                .map_err(|e| LakestackError::internal(format!("{e}")))?,
            action,
        })
    }

    /// Uploads a single file.
    async fn copy_file(&self, source: &Path, remote_path: &str, options: &DeployOptions) -> Result<()> {
        info!("Copying {} -> {remote_path}", source.display());

        let contents = fs::read(source).await?;
        self.dbfs.put(remote_path, &contents, options.overwrite).await
    }

    /// Uploads a directory tree, creating remote directories as needed.
    async fn copy_directory(
        &self,
        source: &Path,
        remote_path: &str,
        options: &DeployOptions,
    ) -> Result<()> {
        info!("Copying directory {} -> {remote_path}", source.display());

        self.dbfs.mkdirs(remote_path).await?;

        let mut pending = vec![(source.to_path_buf(), remote_path.to_string())];
        while let Some((local_dir, remote_dir)) = pending.pop() {
            let mut entries = fs::read_dir(&local_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let child_path = format!("{}/{name}", remote_dir.trim_end_matches('/'));

                if entry.file_type().await?.is_dir() {
                    self.dbfs.mkdirs(&child_path).await?;
                    pending.push((entry.path(), child_path));
                } else {
                    let contents = fs::read(entry.path()).await?;
                    self.dbfs
                        .put(&child_path, &contents, options.overwrite)
                        .await?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FileInfo, MockDbfsService};
    use tempfile::TempDir;

    fn properties(path: &str, source_path: &Path, is_dir: bool) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(String::from("path"), json!(path));
        properties.insert(
            String::from("source_path"),
            json!(source_path.to_string_lossy()),
        );
        properties.insert(String::from("is_dir"), json!(is_dir));
        properties
    }

    fn file_info(path: &str, is_dir: bool) -> FileInfo {
        FileInfo {
            path: path.to_string(),
            is_dir,
            file_size: 0,
        }
    }

    #[tokio::test]
    async fn test_file_copy() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("seed.csv");
        std::fs::write(&source, "a,b\n1,2\n").unwrap();

        let mut dbfs = MockDbfsService::new();
        dbfs.expect_put()
            .withf(|path: &str, contents: &[u8], overwrite: &bool| {
                path == "dbfs:/data/seed.csv" && contents.starts_with(b"a,b") && *overwrite
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        dbfs.expect_get_status()
            .returning(|path| Ok(file_info(path, false)));

        let deployer = DbfsObjectDeployer::new(Arc::new(dbfs));
        let outcome = deployer
            .deploy(
                "r1",
                &properties("dbfs:/data/seed.csv", &source, false),
                None,
                &DeployOptions { overwrite: true },
            )
            .await
            .unwrap();

        assert_eq!(outcome.physical_id["path"], json!("dbfs:/data/seed.csv"));
        assert_eq!(outcome.action, DeployAction::Created);
    }

    #[tokio::test]
    async fn test_directory_copy_recurses() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("data");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("a.csv"), "1").unwrap();
        std::fs::create_dir(source.join("sub")).unwrap();
        std::fs::write(source.join("sub/b.csv"), "2").unwrap();

        let mut dbfs = MockDbfsService::new();
        dbfs.expect_mkdirs().times(2).returning(|_| Ok(()));
        dbfs.expect_put().times(2).returning(|_, _, _| Ok(()));
        dbfs.expect_get_status()
            .returning(|path| Ok(file_info(path, true)));

        let deployer = DbfsObjectDeployer::new(Arc::new(dbfs));
        deployer
            .deploy(
                "r1",
                &properties("dbfs:/data", &source, true),
                None,
                &DeployOptions::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("seed.csv");
        std::fs::write(&source, "1").unwrap();

        let deployer = DbfsObjectDeployer::new(Arc::new(MockDbfsService::new()));

        // Declared directory, actual file.
        let result = deployer
            .deploy(
                "r1",
                &properties("dbfs:/data", &source, true),
                None,
                &DeployOptions::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(LakestackError::Deploy(DeployError::TypeMismatch { .. }))
        ));

        // Declared file, actual directory.
        let result = deployer
            .deploy(
                "r1",
                &properties("dbfs:/data", temp_dir.path(), false),
                None,
                &DeployOptions::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(LakestackError::Deploy(DeployError::TypeMismatch { .. }))
        ));
    }
}
