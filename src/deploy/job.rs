//! Job deployer.
//!
//! Jobs are the one kind whose physical identity is a remote-assigned id
//! rather than a declared path, so binding a declaration to a remote
//! object takes real reconciliation:
//!
//! 1. A recorded job id that still resolves is updated in place.
//! 2. A recorded job id that no longer resolves (deleted out-of-band) is
//!    treated as if it never existed, and the declaration re-enters the
//!    search path below.
//! 3. With no usable prior id, remote jobs are searched by the declared
//!    name: zero matches creates, exactly one match is adopted, and more
//!    than one match is a hard stop — the engine never picks one.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::api::{Job, JobService};
use crate::error::{ApiError, DeployError, LakestackError, Result};

use super::{DeployAction, DeployOptions, DeployOutcome};

/// Deploys JOB resources.
pub struct JobDeployer {
    /// Jobs service client.
    jobs: Arc<dyn JobService>,
}

impl JobDeployer {
    /// Creates a new job deployer.
    #[must_use]
    pub fn new(jobs: Arc<dyn JobService>) -> Self {
        Self { jobs }
    }

    /// Creates or updates the remote job for one declared resource.
    ///
    /// # Errors
    ///
    /// Fails if the properties lack a `name`, if more than one remote job
    /// matches the declared name, or if a remote call fails.
    pub async fn deploy(
        &self,
        resource_id: &str,
        properties: &Map<String, Value>,
        prior_physical_id: Option<&Map<String, Value>>,
        _options: &DeployOptions,
    ) -> Result<DeployOutcome> {
        let name = properties
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DeployError::invalid_properties(
                    resource_id,
                    "job properties require a string 'name'",
                )
            })?
            .to_string();

        let settings = Value::Object(properties.clone());

        let prior_job_id = prior_physical_id
            .and_then(|id| id.get("job_id"))
            .and_then(Value::as_u64);

        let mut had_prior = false;

        if let Some(job_id) = prior_job_id {
            had_prior = true;
            match self.jobs.get_job(job_id).await {
                Ok(_) => {
                    info!("Updating job '{name}' in place (id {job_id})");
                    self.jobs.reset_job(job_id, &settings).await?;
                    return Ok(Self::outcome(job_id, &settings, DeployAction::Updated));
                }
                Err(LakestackError::Api(ApiError::NotFound { .. })) => {
                    warn!(
                        "Job {job_id} recorded for resource '{resource_id}' no longer exists \
                         remotely; redeploying from scratch"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        // No usable prior id: search remote jobs by the declared name.
        let matches: Vec<Job> = self
            .jobs
            .list_jobs()
            .await?
            .into_iter()
            .filter(|job| job.name() == Some(name.as_str()))
            .collect();
        debug!("Found {} remote jobs named '{name}'", matches.len());

        match matches.as_slice() {
            [] => {
                let job_id = self.jobs.create_job(&settings).await?;
                let action = if had_prior {
                    DeployAction::Recreated
                } else {
                    DeployAction::Created
                };
                info!("Created job '{name}' (id {job_id})");
                Ok(Self::outcome(job_id, &settings, action))
            }
            [existing] => {
                let job_id = existing.job_id;
                info!("Adopting existing job '{name}' (id {job_id})");
                self.jobs.reset_job(job_id, &settings).await?;
                Ok(Self::outcome(job_id, &settings, DeployAction::Adopted))
            }
            many => Err(LakestackError::Deploy(DeployError::AmbiguousResource {
                kind: String::from("JOB"),
                name,
                matches: many.len(),
            })),
        }
    }

    /// Builds the outcome for a converged job.
    fn outcome(job_id: u64, settings: &Value, action: DeployAction) -> DeployOutcome {
        let mut physical_id = Map::new();
        physical_id.insert(String::from("job_id"), json!(job_id));

        DeployOutcome {
            physical_id,
            deploy_output: json!({
                "job_id": job_id,
                "settings": settings,
            }),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockJobService;
    use mockall::predicate::eq;

    fn properties(name: &str) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(String::from("name"), json!(name));
        properties
    }

    fn physical_id(job_id: u64) -> Map<String, Value> {
        let mut id = Map::new();
        id.insert(String::from("job_id"), json!(job_id));
        id
    }

    fn remote_job(job_id: u64, name: &str) -> Job {
        Job {
            job_id,
            settings: json!({ "name": name }),
        }
    }

    #[tokio::test]
    async fn test_prior_id_updates_in_place() {
        let mut jobs = MockJobService::new();
        jobs.expect_get_job()
            .with(eq(42))
            .returning(|id| Ok(remote_job(id, "j")));
        jobs.expect_reset_job().with(eq(42), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        jobs.expect_create_job().times(0);

        let deployer = JobDeployer::new(Arc::new(jobs));
        let outcome = deployer
            .deploy("r1", &properties("j"), Some(&physical_id(42)), &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.physical_id["job_id"], json!(42));
        assert_eq!(outcome.action, DeployAction::Updated);
    }

    #[tokio::test]
    async fn test_vanished_prior_id_recreates() {
        let mut jobs = MockJobService::new();
        jobs.expect_get_job()
            .with(eq(5))
            .returning(|_| Err(ApiError::not_found("job 5").into()));
        jobs.expect_list_jobs().returning(|| Ok(vec![]));
        jobs.expect_create_job().times(1).returning(|_| Ok(9));

        let deployer = JobDeployer::new(Arc::new(jobs));
        let outcome = deployer
            .deploy("r1", &properties("j"), Some(&physical_id(5)), &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.physical_id["job_id"], json!(9));
        assert_eq!(outcome.action, DeployAction::Recreated);
    }

    #[tokio::test]
    async fn test_no_prior_no_match_creates() {
        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs()
            .returning(|| Ok(vec![remote_job(1, "other")]));
        jobs.expect_create_job().times(1).returning(|_| Ok(101));

        let deployer = JobDeployer::new(Arc::new(jobs));
        let outcome = deployer
            .deploy("r1", &properties("j"), None, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.physical_id["job_id"], json!(101));
        assert_eq!(outcome.action, DeployAction::Created);
    }

    #[tokio::test]
    async fn test_single_match_is_adopted() {
        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs()
            .returning(|| Ok(vec![remote_job(7, "j"), remote_job(8, "other")]));
        jobs.expect_reset_job()
            .with(eq(7), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        jobs.expect_create_job().times(0);

        let deployer = JobDeployer::new(Arc::new(jobs));
        let outcome = deployer
            .deploy("r1", &properties("j"), None, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.physical_id["job_id"], json!(7));
        assert_eq!(outcome.action, DeployAction::Adopted);
    }

    #[tokio::test]
    async fn test_multiple_matches_is_ambiguous() {
        let mut jobs = MockJobService::new();
        jobs.expect_list_jobs()
            .returning(|| Ok(vec![remote_job(7, "j"), remote_job(8, "j")]));
        jobs.expect_create_job().times(0);
        jobs.expect_reset_job().times(0);

        let deployer = JobDeployer::new(Arc::new(jobs));
        let result = deployer
            .deploy("r1", &properties("j"), None, &DeployOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(LakestackError::Deploy(DeployError::AmbiguousResource {
                matches: 2,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_missing_name_is_invalid() {
        let deployer = JobDeployer::new(Arc::new(MockJobService::new()));
        let result = deployer
            .deploy("r1", &Map::new(), None, &DeployOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(LakestackError::Deploy(DeployError::InvalidProperties { .. }))
        ));
    }
}
