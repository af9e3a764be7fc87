//! Workspace API client implementation.
//!
//! This module provides the HTTP client for the workspace REST API. The
//! per-service call surfaces live in the sibling modules; this file owns
//! connection setup, authentication, retries, and status-code mapping.

use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{ApiError, ConfigError, LakestackError, Result};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Environment variable holding the workspace base URL.
const HOST_ENV_VAR: &str = "LAKESTACK_HOST";

/// Environment variable holding the API token.
const TOKEN_ENV_VAR: &str = "LAKESTACK_TOKEN";

/// Connection settings for one workspace.
///
/// Constructed once at startup and passed down explicitly; nothing in the
/// engine reads ambient session state.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Workspace base URL (e.g. `https://workspace.example.com`).
    pub host: String,
    /// Bearer token for authentication.
    pub token: String,
}

impl ApiConfig {
    /// Builds the connection settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `LAKESTACK_HOST` or `LAKESTACK_TOKEN` is unset.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var(HOST_ENV_VAR).map_err(|_| {
            LakestackError::Config(ConfigError::MissingEnvVar {
                name: String::from(HOST_ENV_VAR),
            })
        })?;
        let token = std::env::var(TOKEN_ENV_VAR).map_err(|_| {
            LakestackError::Config(ConfigError::MissingEnvVar {
                name: String::from(TOKEN_ENV_VAR),
            })
        })?;

        Ok(Self { host, token })
    }
}

/// Workspace API client.
#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    /// HTTP client.
    http: Client,
    /// Connection settings.
    config: ApiConfig,
}

/// Request payload for a single API call.
pub(crate) enum Payload<'a> {
    /// URL query parameters (GET endpoints).
    Query(&'a [(&'a str, String)]),
    /// JSON body (POST endpoints).
    Json(&'a Value),
}

impl WorkspaceClient {
    /// Creates a new workspace API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(config: ApiConfig, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Issues a GET request and deserializes the JSON response.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.execute(Method::GET, endpoint, &Payload::Query(query))
            .await
    }

    /// Issues a POST request and deserializes the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T> {
        self.execute(Method::POST, endpoint, &Payload::Json(body))
            .await
    }

    /// Executes a request with bounded retry on transient failures.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: &Payload<'_>,
    ) -> Result<T> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {endpoint}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            match self.execute_once(method.clone(), endpoint, payload).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LakestackError::Api(ApiError::NetworkError {
                message: String::from("Max retries exceeded"),
            })
        }))
    }

    /// Executes a single request.
    async fn execute_once<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: &Payload<'_>,
    ) -> Result<T> {
        let url = format!(
            "{}/api/2.0/{endpoint}",
            self.config.host.trim_end_matches('/')
        );
        trace!("{method} {url}");

        let mut request = self
            .http
            .request(method, &url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.token),
            )
            .header(header::CONTENT_TYPE, "application/json");

        request = match payload {
            Payload::Query(query) => request.query(query),
            Payload::Json(body) => request.json(body),
        };

        let response = request.send().await.map_err(|e| {
            LakestackError::Api(ApiError::NetworkError {
                message: format!("Request failed: {e}"),
            })
        })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let retry_after = if retry_after == 0 { 60 } else { retry_after };

            return Err(LakestackError::Api(ApiError::RateLimited {
                retry_after_secs: retry_after,
            }));
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LakestackError::Api(ApiError::AuthenticationFailed {
                message: String::from("Invalid or expired API token"),
            }));
        }

        if status.as_u16() == 404 {
            return Err(LakestackError::Api(ApiError::not_found(endpoint)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LakestackError::Api(ApiError::request_failed(
                status.as_u16(),
                body,
            )));
        }

        response.json().await.map_err(|e| {
            LakestackError::Api(ApiError::InvalidResponse {
                message: format!("Failed to parse response: {e}"),
            })
        })
    }
}
