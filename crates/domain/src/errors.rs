//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Rootline
///
/// The execution core surfaces a closed set of failure kinds. Nothing here
/// is retried internally except the single 401-triggered re-authentication
/// handled by the dispatcher; everything else propagates on first
/// occurrence.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RootlineError {
    /// The token endpoint rejected the configured username/password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A connection to the tree service could not be established.
    #[error("Cannot connect to tree service: {0}")]
    ServiceUnreachable(String),

    /// The network call itself timed out.
    #[error("Request timeout: {0}")]
    RequestTimeout(String),

    /// A second 401 occurred after one forced re-authentication.
    #[error("Authentication failed after token refresh")]
    AuthenticationFailed,

    /// A path template placeholder was never filled.
    #[error("Missing required path parameter: {0}")]
    MissingPathParameter(String),

    /// Any other non-2xx status from the remote service.
    #[error("{kind} (HTTP {status})")]
    RemoteOperationFailed {
        /// HTTP status code returned by the service.
        status: u16,
        /// Classification derived from the status code.
        kind: RemoteFailureKind,
    },

    /// A polled task reported a failed terminal state.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// A polled task never reached a terminal state within the budget.
    #[error("Task {task_id} timed out after {timeout_secs} seconds")]
    TaskTimeout {
        /// Identifier of the server-side task.
        task_id: String,
        /// Configured polling budget in seconds.
        timeout_secs: u64,
    },

    /// Configuration could not be loaded or was invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invariant violation inside the adapter itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Human-readable classification of a remote HTTP failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFailureKind {
    /// 404
    NotFound,
    /// 422
    InvalidData,
    /// 403
    PermissionDenied,
    /// 5xx
    ServerError,
    /// Anything else outside 2xx
    Other,
}

impl RemoteFailureKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            422 => Self::InvalidData,
            403 => Self::PermissionDenied,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::NotFound => "Record not found",
            Self::InvalidData => "Invalid data provided",
            Self::PermissionDenied => "Permission denied for this operation",
            Self::ServerError => "Server error, try again later",
            Self::Other => "Request failed",
        };
        write!(f, "{msg}")
    }
}

/// Result type alias for Rootline operations
pub type Result<T> = std::result::Result<T, RootlineError>;
