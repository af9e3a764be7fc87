//! Jobs service surface.
//!
//! The job deployer consumes this trait; the workspace client implements
//! it over the REST API. Job ids are assigned by the remote service and
//! are opaque to everything except the job deployer.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, LakestackError, Result};

use super::client::WorkspaceClient;

/// A job as reported by the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Remote job identifier.
    pub job_id: u64,
    /// Job settings, including the declared `name`.
    #[serde(default)]
    pub settings: Value,
}

impl Job {
    /// Returns the job's declared name, if present in its settings.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.settings.get("name").and_then(Value::as_str)
    }
}

/// Remote operations on jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobService: Send + Sync {
    /// Creates a job from the given settings; returns the new job id.
    async fn create_job(&self, settings: &Value) -> Result<u64>;

    /// Fetches a job by id.
    ///
    /// Fails with a not-found error if no job has that id.
    async fn get_job(&self, job_id: u64) -> Result<Job>;

    /// Replaces a job's settings in place.
    async fn reset_job(&self, job_id: u64, settings: &Value) -> Result<()>;

    /// Lists all jobs in the workspace.
    async fn list_jobs(&self) -> Result<Vec<Job>>;
}

#[async_trait]
impl JobService for WorkspaceClient {
    async fn create_job(&self, settings: &Value) -> Result<u64> {
        #[derive(Deserialize)]
        struct Response {
            job_id: u64,
        }

        let response: Response = self.post_json("jobs/create", settings).await?;
        Ok(response.job_id)
    }

    async fn get_job(&self, job_id: u64) -> Result<Job> {
        let query = [("job_id", job_id.to_string())];
        self.get_json("jobs/get", &query).await.map_err(|e| match e {
            LakestackError::Api(ApiError::NotFound { .. }) => {
                LakestackError::Api(ApiError::not_found(format!("job {job_id}")))
            }
            other => other,
        })
    }

    async fn reset_job(&self, job_id: u64, settings: &Value) -> Result<()> {
        let body = json!({
            "job_id": job_id,
            "new_settings": settings,
        });
        let _: Value = self.post_json("jobs/reset", &body).await?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            jobs: Vec<Job>,
        }

        let response: Response = self.get_json("jobs/list", &[]).await?;
        Ok(response.jobs)
    }
}
