//! Workspace object deployer.
//!
//! A workspace object's physical identity is its declared remote path, so
//! there is no id-mapping machinery here: deploying imports the local
//! source to that path, and re-deploying converges on whatever lives
//! there. The deployer validates that the local source shape agrees with
//! the declared type before any remote call is made.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::api::{ImportRequest, WorkspaceService};
use crate::error::{DeployError, LakestackError, Result};

use super::{DeployAction, DeployOptions, DeployOutcome};

/// Declared shape of a workspace object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ObjectType {
    /// A single notebook.
    Notebook,
    /// A directory imported recursively.
    Directory,
}

/// Typed view of a WORKSPACE_OBJECT resource's properties.
#[derive(Debug, Deserialize)]
struct WorkspaceObjectProperties {
    /// Absolute workspace destination path.
    path: String,
    /// Local source path, resolved against the config directory.
    source_path: String,
    /// Declared shape.
    object_type: ObjectType,
    /// Notebook language override; inferred from the extension if absent.
    #[serde(default)]
    language: Option<String>,
    /// Import format override.
    #[serde(default)]
    format: Option<String>,
}

/// Deploys WORKSPACE_OBJECT resources.
pub struct WorkspaceObjectDeployer {
    /// Workspace-tree service client.
    workspace: Arc<dyn WorkspaceService>,
}

impl WorkspaceObjectDeployer {
    /// Creates a new workspace object deployer.
    #[must_use]
    pub fn new(workspace: Arc<dyn WorkspaceService>) -> Self {
        Self { workspace }
    }

    /// Imports the local source to the declared workspace path.
    ///
    /// # Errors
    ///
    /// Fails if the properties are malformed, the local source is missing
    /// or disagrees with the declared type, or a remote call fails.
    pub async fn deploy(
        &self,
        resource_id: &str,
        properties: &Map<String, Value>,
        prior_physical_id: Option<&Map<String, Value>>,
        options: &DeployOptions,
    ) -> Result<DeployOutcome> {
        let props = parse_properties(resource_id, properties)?;
        let source = PathBuf::from(&props.source_path);
        let metadata = fs::metadata(&source).await.map_err(|_| {
            LakestackError::Deploy(DeployError::SourceNotFound {
                path: source.clone(),
            })
        })?;

        match props.object_type {
            ObjectType::Notebook if metadata.is_dir() => {
                return Err(LakestackError::Deploy(DeployError::TypeMismatch {
                    path: source,
                    declared: String::from("NOTEBOOK"),
                    actual: String::from("directory"),
                }));
            }
            ObjectType::Directory if !metadata.is_dir() => {
                return Err(LakestackError::Deploy(DeployError::TypeMismatch {
                    path: source,
                    declared: String::from("DIRECTORY"),
                    actual: String::from("file"),
                }));
            }
            _ => {}
        }

        match props.object_type {
            ObjectType::Notebook => {
                self.import_notebook(&source, &props, options).await?;
            }
            ObjectType::Directory => {
                self.import_directory(&source, &props, options).await?;
            }
        }

        let info = self.workspace.get_status(&props.path).await?;

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

    /// Imports a single notebook.
    async fn import_notebook(
        &self,
        source: &Path,
        props: &WorkspaceObjectProperties,
        options: &DeployOptions,
    ) -> Result<()> {
        info!("Importing notebook {} -> {}", source.display(), props.path);

        let content = fs::read(source).await?;
        let language = props
            .language
            .clone()
            .or_else(|| language_for_source(source).map(String::from));

        self.workspace
            .import(&ImportRequest {
                path: props.path.clone(),
                content,
                language,
                format: props.format.clone(),
                overwrite: options.overwrite,
            })
            .await
    }

    /// Imports a directory tree, creating remote directories as needed.
    async fn import_directory(
        &self,
        source: &Path,
        props: &WorkspaceObjectProperties,
        options: &DeployOptions,
    ) -> Result<()> {
        info!(
            "Importing directory {} -> {}",
            source.display(),
            props.path
        );

        self.workspace.mkdirs(&props.path).await?;

        let mut pending = vec![(source.to_path_buf(), props.path.clone())];
        while let Some((local_dir, remote_dir)) = pending.pop() {
            let mut entries = fs::read_dir(&local_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let name = entry.file_name().to_string_lossy().into_owned();

                if file_type.is_dir() {
                    let remote_path = join_remote(&remote_dir, &name);
                    self.workspace.mkdirs(&remote_path).await?;
                    pending.push((entry.path(), remote_path));
                    continue;
                }

                let language = language_for_source(&entry.path());
                // Notebooks are addressed without their source extension.
                let remote_name = if language.is_some() {
                    entry
                        .path()
                        .file_stem()
                        .map_or(name, |stem| stem.to_string_lossy().into_owned())
                } else {
                    name
                };
                let remote_path = join_remote(&remote_dir, &remote_name);

                let content = fs::read(entry.path()).await?;
                self.workspace
                    .import(&ImportRequest {
                        path: remote_path,
                        content,
                        language: language.map(String::from),
                        format: props.format.clone(),
                        overwrite: options.overwrite,
                    })
                    .await?;
            }
        }

        Ok(())
    }

    /// Exports the remote object back to its local source path.
    ///
    /// Existing local files are left untouched (with a warning) unless
    /// `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Fails if the properties are malformed or a remote call fails.
    pub async fn download(
        &self,
        resource_id: &str,
        properties: &Map<String, Value>,
        options: &DeployOptions,
    ) -> Result<()> {
        let props = parse_properties(resource_id, properties)?;
        let destination = PathBuf::from(&props.source_path);

        match props.object_type {
            ObjectType::Notebook => {
                self.export_notebook(&props.path, &destination, options)
                    .await
            }
            ObjectType::Directory => {
                self.export_directory(&props.path, &destination, options)
                    .await
            }
        }
    }

    /// Exports a single notebook to a local file.
    async fn export_notebook(
        &self,
        remote_path: &str,
        destination: &Path,
        options: &DeployOptions,
    ) -> Result<()> {
        if destination.exists() && !options.overwrite {
            warn!(
                "Skipping {}: local file exists (pass --overwrite to replace)",
                destination.display()
            );
            return Ok(());
        }

        info!("Exporting {} -> {}", remote_path, destination.display());

        let content = self.workspace.export(remote_path).await?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(destination, content).await?;
        Ok(())
    }

    /// Exports a directory tree to a local directory.
    async fn export_directory(
        &self,
        remote_path: &str,
        destination: &Path,
        options: &DeployOptions,
    ) -> Result<()> {
        info!(
            "Exporting directory {} -> {}",
            remote_path,
            destination.display()
        );

        let mut pending = vec![(remote_path.to_string(), destination.to_path_buf())];
        while let Some((remote_dir, local_dir)) = pending.pop() {
            fs::create_dir_all(&local_dir).await?;

            for object in self.workspace.list(&remote_dir).await? {
                let name = object
                    .path
                    .rsplit('/')
                    .next()
                    .unwrap_or(object.path.as_str())
                    .to_string();

                if object.object_type == "DIRECTORY" {
                    pending.push((object.path, local_dir.join(name)));
                    continue;
                }

                let file_name = match object
                    .language
                    .as_deref()
                    .and_then(extension_for_language)
                {
                    Some(extension) => format!("{name}.{extension}"),
                    None => name,
                };
                self.export_notebook(&object.path, &local_dir.join(file_name), options)
                    .await?;
            }
        }

        debug!("Export of {remote_path} complete");
        Ok(())
    }
}

/// Parses the typed property view out of the raw property map.
fn parse_properties(
    resource_id: &str,
    properties: &Map<String, Value>,
) -> Result<WorkspaceObjectProperties> {
    serde_json::from_value(Value::Object(properties.clone())).map_err(|e| {
        LakestackError::Deploy(DeployError::invalid_properties(resource_id, e.to_string()))
    })
}

/// Joins a child name onto a remote directory path.
fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{name}", dir.trim_end_matches('/'))
}

/// Maps a local source extension to a notebook language.
fn language_for_source(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "py" => Some("PYTHON"),
        "scala" => Some("SCALA"),
        "sql" => Some("SQL"),
        "r" | "R" => Some("R"),
        _ => None,
    }
}

/// Maps a notebook language back to a local source extension.
fn extension_for_language(language: &str) -> Option<&'static str> {
    match language {
        "PYTHON" => Some("py"),
        "SCALA" => Some("scala"),
        "SQL" => Some("sql"),
        "R" => Some("r"),
        _ => None,
    }
}
