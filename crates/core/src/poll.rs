//! Asynchronous task polling
//!
//! Report generation is accepted immediately by the service and completed
//! later by a worker. This module absorbs that latency behind one call:
//! poll the task-status resource until a terminal state or the configured
//! budget is reached.
//!
//! State machine: `Pending -> {Succeeded, Failed, TimedOut}`; all three
//! outcomes are terminal. Timeout is tracked from the first poll. The
//! final backoff sleep is not truncated to the remaining budget; a slight
//! overshoot is accepted in exchange for a simpler loop.

use std::time::Duration;

use async_trait::async_trait;
use rootline_domain::constants::{
    DEFAULT_TASK_TIMEOUT_SECS, TASK_POLL_BACKOFF_FACTOR, TASK_POLL_INITIAL_SECS,
    TASK_POLL_MAX_SECS,
};
use rootline_domain::{Record, Result, RootlineError};
use serde_json::Value;
use tracing::{debug, warn};

/// Where task-status records come from.
///
/// Implemented by the dispatcher against the `tasks/{task_id}/` resource.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    /// Fetch the current status record for a task.
    async fn task_status(&self, task_id: &str) -> Result<Record>;
}

/// Polling cadence and budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second poll.
    pub initial_interval: Duration,
    /// Upper bound on the backoff interval.
    pub max_interval: Duration,
    /// Multiplier applied to the interval after each non-terminal poll.
    pub backoff_factor: f64,
    /// Total budget for the task to reach a terminal state.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(TASK_POLL_INITIAL_SECS),
            max_interval: Duration::from_secs(TASK_POLL_MAX_SECS),
            backoff_factor: TASK_POLL_BACKOFF_FACTOR,
            timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
        }
    }
}

impl PollConfig {
    /// Config with the task timeout taken from application configuration.
    #[must_use]
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self { timeout: Duration::from_secs(timeout_secs), ..Self::default() }
    }
}

/// What one status record says about the task.
enum TaskProgress {
    Pending(String),
    Succeeded(Value),
    Failed(String),
}

/// Interpret a status record.
///
/// The `state` field is compared case-insensitively. A successful task
/// yields `result_object`, falling back to `result`; when neither is
/// present the whole status payload stands in for the result.
fn interpret_status(task_id: &str, status: &Record) -> TaskProgress {
    let state = status
        .get("state")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_uppercase();

    match state.as_str() {
        "SUCCESS" => {
            let result = status
                .get("result_object")
                .filter(|v| !v.is_null())
                .or_else(|| status.get("result").filter(|v| !v.is_null()))
                .cloned();
            match result {
                Some(value) => TaskProgress::Succeeded(value),
                None => {
                    warn!(task_id, "task succeeded but no result found in status payload");
                    TaskProgress::Succeeded(Value::Object(status.clone()))
                }
            }
        }
        "FAILURE" | "FAILED" => {
            let info = status
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("Task failed")
                .to_string();
            TaskProgress::Failed(info)
        }
        _ => TaskProgress::Pending(state),
    }
}

/// Poll a task until it reaches a terminal state.
///
/// # Errors
/// - [`RootlineError::TaskFailed`] when the service reports a failed
///   terminal state, carrying the server-supplied detail.
/// - [`RootlineError::TaskTimeout`] when the budget elapses first.
/// - Any dispatch error from the status source propagates unchanged.
pub async fn wait_for_task(
    source: &dyn TaskStatusSource,
    task_id: &str,
    config: &PollConfig,
) -> Result<Value> {
    let started = tokio::time::Instant::now();
    let mut interval = config.initial_interval;

    loop {
        if started.elapsed() > config.timeout {
            return Err(RootlineError::TaskTimeout {
                task_id: task_id.to_string(),
                timeout_secs: config.timeout.as_secs(),
            });
        }

        let status = source.task_status(task_id).await?;

        match interpret_status(task_id, &status) {
            TaskProgress::Succeeded(result) => return Ok(result),
            TaskProgress::Failed(info) => return Err(RootlineError::TaskFailed(info)),
            TaskProgress::Pending(state) => {
                debug!(
                    task_id,
                    state,
                    wait_secs = interval.as_secs_f64(),
                    "task still running"
                );
                tokio::time::sleep(interval).await;
                interval = next_interval(interval, config);
            }
        }
    }
}

/// Grow the backoff interval, capped at the configured maximum.
fn next_interval(current: Duration, config: &PollConfig) -> Duration {
    let grown = current.as_secs_f64() * config.backoff_factor;
    Duration::from_secs_f64(grown.min(config.max_interval.as_secs_f64()))
}
