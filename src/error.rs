//! Error types for the lakestack deployment engine.
//!
//! This module provides the error hierarchy for all operations in the
//! deployment lifecycle: configuration loading, status persistence,
//! workspace API calls, and per-resource deployment.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lakestack operations.
#[derive(Debug, Error)]
pub enum LakestackError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-resource deployment errors.
    #[error("Deployment error: {0}")]
    Deploy(#[from] DeployError),

    /// Workspace API errors.
    #[error("Workspace API error: {0}")]
    Api(#[from] ApiError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The stack configuration file was not found.
    #[error("Stack configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The stack configuration file could not be parsed.
    #[error("Failed to parse stack configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Stack configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Two resources in the stack share the same id.
    #[error("Duplicate resource id: {id}")]
    DuplicateId {
        /// The duplicated resource id.
        id: String,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Per-resource deployment errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// More than one remote object matches the declared name.
    ///
    /// This is a hard stop: the engine refuses to pick one of the
    /// candidates and requires operator intervention.
    #[error(
        "Ambiguous {kind} named '{name}': {matches} remote objects match; \
         resolve manually before deploying"
    )]
    AmbiguousResource {
        /// Resource kind.
        kind: String,
        /// The declared name that matched multiple remote objects.
        name: String,
        /// Number of matching remote objects.
        matches: usize,
    },

    /// The declared object shape disagrees with the local filesystem.
    #[error("{path} is a {actual} but the resource declares a {declared}")]
    TypeMismatch {
        /// Local source path that was inspected.
        path: PathBuf,
        /// The declared shape (e.g. DIRECTORY).
        declared: String,
        /// The actual shape found on disk (e.g. file).
        actual: String,
    },

    /// The local source path does not exist.
    #[error("Local source path not found: {path}")]
    SourceNotFound {
        /// The missing local path.
        path: PathBuf,
    },

    /// A resource's properties are missing or malformed.
    #[error("Invalid properties for resource '{id}': {message}")]
    InvalidProperties {
        /// Stack-local resource id.
        id: String,
        /// Description of the problem.
        message: String,
    },
}

/// Workspace API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed.
    #[error("Workspace authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("Workspace API request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("Workspace API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Remote object not found.
    #[error("Remote object not found: {identifier}")]
    NotFound {
        /// Identifier of the missing object (job id or path).
        identifier: String,
    },

    /// Network error.
    #[error("Network error communicating with the workspace: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from the workspace API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Result type alias for lakestack operations.
pub type Result<T> = std::result::Result<T, LakestackError>;

impl LakestackError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::RateLimited { .. } | ApiError::NetworkError { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Api(ApiError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            Self::Api(ApiError::NetworkError { .. }) => Some(5),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl DeployError {
    /// Creates an invalid-properties error for a resource.
    #[must_use]
    pub fn invalid_properties(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperties {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Creates an API request error.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }
}
