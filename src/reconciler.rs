//! Reconciler for converging declared stacks onto the remote workspace.
//!
//! This module composes the config, status, and deployer layers into the
//! end-to-end deploy operation: load the prior status, deploy each
//! resource in declaration order against its recorded physical id, and
//! persist the new status only once every resource has succeeded. A
//! failure on any resource aborts the run and persists nothing from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{DbfsService, JobService, WorkspaceService};
use crate::config::{ResourceKind, StackConfig};
use crate::cwd::WorkingDirectoryScope;
use crate::deploy::{
    DbfsObjectDeployer, DeployOptions, JobDeployer, WorkspaceObjectDeployer,
};
use crate::error::Result;
use crate::status::{DeployedResourceRecord, StackStatus, StatusStore};

/// Reconciler for one workspace connection.
pub struct Reconciler {
    /// Job deployer.
    jobs: JobDeployer,
    /// Workspace object deployer.
    workspace_objects: WorkspaceObjectDeployer,
    /// DBFS object deployer.
    dbfs_objects: DbfsObjectDeployer,
}

impl Reconciler {
    /// Creates a reconciler over the three service surfaces.
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobService>,
        workspace: Arc<dyn WorkspaceService>,
        dbfs: Arc<dyn DbfsService>,
    ) -> Self {
        Self {
            jobs: JobDeployer::new(jobs),
            workspace_objects: WorkspaceObjectDeployer::new(workspace),
            dbfs_objects: DbfsObjectDeployer::new(dbfs),
        }
    }

    /// Deploys every resource in the stack, in declaration order.
    ///
    /// Relative paths inside resource properties resolve against the
    /// directory containing `config_path` for the duration of the run.
    /// The new status is persisted only if every resource succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first per-resource failure; nothing from the failed
    /// run is persisted.
    pub async fn deploy(
        &self,
        config: &StackConfig,
        config_path: &Path,
        options: &DeployOptions,
    ) -> Result<StackStatus> {
        info!(
            "Deploying stack '{}' ({} resources)",
            config.name,
            config.resources.len()
        );

        // Resolve before entering the scope so the status path stays
        // valid while the working directory is redirected.
        let config_path = std::fs::canonicalize(config_path)?;
        let config_dir = config_dir(&config_path);
        let store = StatusStore::new(&config_path);

        let _scope = WorkingDirectoryScope::enter(&config_dir)?;

        let prior = store.load().await;

        let mut status = StackStatus::new(&config.name);
        status.resources = config.resources.clone();

        for resource in &config.resources {
            let prior_id = StatusStore::lookup(prior.as_ref(), &resource.id, resource.kind);
            debug!(
                "Deploying {} '{}' (prior physical id: {})",
                resource.kind,
                resource.id,
                if prior_id.is_some() { "yes" } else { "no" }
            );

            let outcome = match resource.kind {
                ResourceKind::Job => {
                    self.jobs
                        .deploy(&resource.id, &resource.properties, prior_id, options)
                        .await?
                }
                ResourceKind::WorkspaceObject => {
                    self.workspace_objects
                        .deploy(&resource.id, &resource.properties, prior_id, options)
                        .await?
                }
                ResourceKind::DbfsObject => {
                    self.dbfs_objects
                        .deploy(&resource.id, &resource.properties, prior_id, options)
                        .await?
                }
            };

            info!("{} {} '{}'", outcome.action, resource.kind, resource.id);

            status.add_record(DeployedResourceRecord::new(
                &resource.id,
                resource.kind,
                outcome.physical_id,
                outcome.deploy_output,
            ));
        }

        store.save(&status).await?;

        info!("Stack '{}' deployed successfully", config.name);
        Ok(status)
    }

    /// Downloads workspace objects back to their local source paths.
    ///
    /// Only WORKSPACE_OBJECT resources participate; other kinds are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns the first per-resource failure.
    pub async fn download(
        &self,
        config: &StackConfig,
        config_path: &Path,
        options: &DeployOptions,
    ) -> Result<()> {
        info!("Downloading workspace objects for stack '{}'", config.name);

        let config_path = std::fs::canonicalize(config_path)?;
        let config_dir = config_dir(&config_path);

        let _scope = WorkingDirectoryScope::enter(&config_dir)?;

        for resource in &config.resources {
            if resource.kind != ResourceKind::WorkspaceObject {
                debug!(
                    "Skipping {} '{}': only workspace objects are downloadable",
                    resource.kind, resource.id
                );
                continue;
            }

            self.workspace_objects
                .download(&resource.id, &resource.properties, options)
                .await?;
        }

        Ok(())
    }
}

/// Returns the directory containing a configuration file.
fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockDbfsService, MockJobService, MockWorkspaceService};
    use crate::api::{Job, ObjectInfo};
    use crate::config::ConfigParser;
    use crate::cwd::TEST_CWD_LOCK;
    use crate::error::{ApiError, DeployError, LakestackError};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("stack.json");
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }

    fn reconciler_with_jobs(jobs: MockJobService) -> Reconciler {
        Reconciler::new(
            Arc::new(jobs),
            Arc::new(MockWorkspaceService::new()),
            Arc::new(MockDbfsService::new()),
        )
    }

    fn lock_cwd() -> std::sync::MutexGuard<'static, ()> {
        TEST_CWD_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[tokio::test]
    async fn test_end_to_end_create_then_update() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{"name":"s","resources":[{"id":"r1","kind":"JOB","properties":{"name":"j"}}]}"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();

        // First run: no prior status, no remote job named "j".
        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs().returning(|| Ok(vec![]));
        jobs.expect_create_job().times(1).returning(|_| Ok(101));

        let status = reconciler_with_jobs(jobs)
            .deploy(&config, &config_path, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(status.deployed.len(), 1);
        assert_eq!(status.deployed[0].id, "r1");
        assert_eq!(status.deployed[0].physical_id["job_id"], json!(101));
        assert!(StatusStore::status_path_for(&config_path).exists());

        // Second run: the persisted status must route to an in-place
        // update of the same job, not a second create.
        let mut jobs = MockJobService::new();
        jobs.expect_get_job().returning(|id| {
            Ok(Job {
                job_id: id,
                settings: json!({"name": "j"}),
            })
        });
        jobs.expect_reset_job().times(1).returning(|_, _| Ok(()));
        jobs.expect_create_job().times(0);

        let rerun = reconciler_with_jobs(jobs)
            .deploy(&config, &config_path, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(rerun.deployed[0].physical_id["job_id"], json!(101));
    }

    #[tokio::test]
    async fn test_mid_run_failure_persists_nothing() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{
                "name": "s",
                "resources": [
                    {"id": "r1", "kind": "JOB", "properties": {"name": "a"}},
                    {"id": "r2", "kind": "JOB", "properties": {"name": "b"}}
                ]
            }"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();

        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs().returning(|| Ok(vec![]));
        jobs.expect_create_job().times(2).returning(|settings| {
            if settings["name"] == json!("a") {
                Ok(1)
            } else {
                Err(ApiError::request_failed(500, "boom").into())
            }
        });

        let result = reconciler_with_jobs(jobs)
            .deploy(&config, &config_path, &DeployOptions::default())
            .await;

        assert!(result.is_err());
        // The first resource succeeded, but nothing from this run may be
        // persisted.
        assert!(!StatusStore::status_path_for(&config_path).exists());
    }

    #[tokio::test]
    async fn test_ambiguous_job_aborts_run() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{"name":"s","resources":[{"id":"r1","kind":"JOB","properties":{"name":"j"}}]}"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();

        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs().returning(|| {
            Ok(vec![
                Job {
                    job_id: 1,
                    settings: json!({"name": "j"}),
                },
                Job {
                    job_id: 2,
                    settings: json!({"name": "j"}),
                },
            ])
        });
        jobs.expect_create_job().times(0);
        jobs.expect_reset_job().times(0);

        let result = reconciler_with_jobs(jobs)
            .deploy(&config, &config_path, &DeployOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(LakestackError::Deploy(DeployError::AmbiguousResource { .. }))
        ));
        assert!(!StatusStore::status_path_for(&config_path).exists());
    }

    #[tokio::test]
    async fn test_working_directory_restored_on_failure() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{
                "name": "s",
                "resources": [
                    {
                        "id": "r1",
                        "kind": "WORKSPACE_OBJECT",
                        "properties": {
                            "path": "/Shared/etl",
                            "source_path": "missing.py",
                            "object_type": "NOTEBOOK"
                        }
                    }
                ]
            }"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();
        let before = std::env::current_dir().unwrap();

        let reconciler = Reconciler::new(
            Arc::new(MockJobService::new()),
            Arc::new(MockWorkspaceService::new()),
            Arc::new(MockDbfsService::new()),
        );
        let result = reconciler
            .deploy(&config, &config_path, &DeployOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[tokio::test]
    async fn test_relative_source_resolves_against_config_dir() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("etl.py"), "pass").unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{
                "name": "s",
                "resources": [
                    {
                        "id": "r1",
                        "kind": "WORKSPACE_OBJECT",
                        "properties": {
                            "path": "/Shared/etl",
                            "source_path": "etl.py",
                            "object_type": "NOTEBOOK"
                        }
                    }
                ]
            }"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();

        let mut workspace = MockWorkspaceService::new();
        workspace.expect_import().times(1).returning(|_| Ok(()));
        workspace.expect_get_status().returning(|path| {
            Ok(ObjectInfo {
                path: path.to_string(),
                object_type: String::from("NOTEBOOK"),
                language: Some(String::from("PYTHON")),
            })
        });

        let reconciler = Reconciler::new(
            Arc::new(MockJobService::new()),
            Arc::new(workspace),
            Arc::new(MockDbfsService::new()),
        );
        let status = reconciler
            .deploy(&config, &config_path, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(status.deployed[0].physical_id["path"], json!("/Shared/etl"));
    }

    #[tokio::test]
    async fn test_download_exports_only_workspace_objects() {
        let _guard = lock_cwd();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            r#"{
                "name": "s",
                "resources": [
                    {"id": "job", "kind": "JOB", "properties": {"name": "j"}},
                    {
                        "id": "nb",
                        "kind": "WORKSPACE_OBJECT",
                        "properties": {
                            "path": "/Shared/etl",
                            "source_path": "etl.py",
                            "object_type": "NOTEBOOK"
                        }
                    }
                ]
            }"#,
        );
        let config = ConfigParser::new().load_file(&config_path).unwrap();

        let mut workspace = MockWorkspaceService::new();
        workspace
            .expect_export()
            .times(1)
            .returning(|_| Ok(b"print('hi')".to_vec()));

        // No job service expectations: downloads must not touch jobs.
        let reconciler = Reconciler::new(
            Arc::new(MockJobService::new()),
            Arc::new(workspace),
            Arc::new(MockDbfsService::new()),
        );
        reconciler
            .download(&config, &config_path, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("etl.py")).unwrap(),
            "print('hi')"
        );
    }
}
