//! Configuration structures
//!
//! Plain data carriers; loading lives in `rootline-infra::config`.

use serde::{Deserialize, Serialize};

use crate::constants::{API_PATH_SUFFIX, DEFAULT_TASK_TIMEOUT_SECS};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote tree service connection settings.
    pub service: ServiceConfig,
    /// Asynchronous task polling settings.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Connection settings for the remote tree service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the tree service (with or without the `/api` suffix).
    pub api_url: String,
    /// Username for password authentication against the token endpoint.
    pub username: String,
    /// Password for password authentication against the token endpoint.
    pub password: String,
    /// Family tree identifier, used as the default collection.
    pub tree_id: String,
}

impl ServiceConfig {
    /// Base path for API requests.
    ///
    /// The configured URL may or may not carry the stable `/api` prefix;
    /// either form resolves to the same base path.
    #[must_use]
    pub fn api_base(&self) -> String {
        let trimmed = self.api_url.trim_end_matches('/');
        if trimmed.ends_with(API_PATH_SUFFIX) {
            trimmed.to_string()
        } else {
            format!("{trimmed}{API_PATH_SUFFIX}")
        }
    }
}

/// Settings for polling server-side asynchronous tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Total budget for one task to reach a terminal state, in seconds.
    pub task_timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS }
    }
}
