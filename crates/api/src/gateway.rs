//! Tool-call gateway
//!
//! One [`Gateway`] instance per configured service. Tool invocations enter
//! through [`Gateway::execute`] with an operation kind, optional
//! parameters, and target identifiers; the outcome is a structured record,
//! a list of records with its out-of-band total count, or a typed error.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rootline_core::poll::{wait_for_task, PollConfig};
use rootline_core::ApiOperation;
use rootline_domain::constants::TOTAL_COUNT_HEADER;
use rootline_domain::{Config, Record, Result, RootlineError};
use rootline_infra::{Session, TreeClient};
use serde_json::Value;
use tracing::{info, warn};

use crate::logging::error_label;

/// Result of one tool invocation.
#[derive(Debug)]
pub enum ToolOutcome {
    /// A single structured record (or scalar payload).
    Record(Value),
    /// A page of records, with the service-reported total when present.
    List {
        /// Records in this page.
        items: Vec<Value>,
        /// Out-of-band total count, which may exceed the page size.
        total_count: Option<u64>,
    },
}

/// Tool-call entry point for one configured tree service.
pub struct Gateway {
    client: TreeClient,
    poll_config: PollConfig,
}

impl Gateway {
    /// Create a gateway with its own session.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let session = Arc::new(Session::new(config.service.clone()));
        Self::with_session(config, session)
    }

    /// Create a gateway sharing an existing session.
    #[must_use]
    pub fn with_session(config: Config, session: Arc<Session>) -> Self {
        let poll_config = PollConfig::with_timeout_secs(config.polling.task_timeout_secs);
        let client = TreeClient::new(config, session);
        Self { client, poll_config }
    }

    /// The underlying dispatcher.
    #[must_use]
    pub fn client(&self) -> &TreeClient {
        &self.client
    }

    /// Execute one tool operation.
    ///
    /// # Errors
    /// Propagates the dispatcher's typed failures unchanged.
    pub async fn execute(
        &self,
        op: ApiOperation,
        params: Option<Record>,
        targets: &BTreeMap<String, String>,
    ) -> Result<ToolOutcome> {
        let started = Instant::now();
        let result = self.client.dispatch_with_headers(op, params, targets).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok((body, headers)) => {
                info!(operation = ?op, duration_ms, "tool_call_success");
                let outcome = match body {
                    Value::Array(items) => {
                        let total_count = headers
                            .get(TOTAL_COUNT_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok());
                        ToolOutcome::List { items, total_count }
                    }
                    other => ToolOutcome::Record(other),
                };
                Ok(outcome)
            }
            Err(error) => {
                warn!(operation = ?op, duration_ms, error = error_label(&error), "tool_call_failure");
                Err(error)
            }
        }
    }

    /// Generate a report, absorbing asynchronous completion.
    ///
    /// A synchronous response carries the result directly; an asynchronous
    /// acceptance carries a task id that is polled to a terminal state.
    ///
    /// # Errors
    /// - `TaskFailed` / `TaskTimeout` from the polling state machine.
    /// - `Internal` when the acceptance carries neither a file name nor a
    ///   task id.
    pub async fn generate_report(&self, report_id: &str, options: &Value) -> Result<Value> {
        let mut params = Record::new();
        params.insert("options".to_string(), Value::String(options.to_string()));
        let mut targets = BTreeMap::new();
        targets.insert("report_id".to_string(), report_id.to_string());

        let accepted =
            self.client.dispatch(ApiOperation::PostReportFile, Some(params), &targets).await?;

        if accepted.get("file_name").is_some() {
            return Ok(accepted);
        }

        let task_id = accepted
            .get("task")
            .and_then(|task| task.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RootlineError::Internal(format!(
                    "report accepted without file name or task id: {accepted}"
                ))
            })?
            .to_string();

        info!(report_id, task_id, "report running as asynchronous task");
        wait_for_task(&self.client, &task_id, &self.poll_config).await
    }

    /// Download a processed report file by name.
    ///
    /// # Errors
    /// Propagates the dispatcher's typed failures unchanged.
    pub async fn download_processed_report(
        &self,
        report_id: &str,
        filename: &str,
    ) -> Result<Value> {
        let mut targets = BTreeMap::new();
        targets.insert("report_id".to_string(), report_id.to_string());
        targets.insert("filename".to_string(), filename.to_string());
        self.client.dispatch(ApiOperation::GetReportProcessed, None, &targets).await
    }

    /// Upload a media file with its own content type.
    ///
    /// # Errors
    /// Propagates the dispatcher's typed failures unchanged.
    pub async fn upload_media(&self, content: Vec<u8>, mime_type: &str) -> Result<Value> {
        self.client.upload_media(content, mime_type).await
    }

    /// Best-effort lookup of an object's public id from its handle.
    ///
    /// Falls back to the handle itself when the object kind is unknown,
    /// the lookup fails, or the record carries no public id.
    pub async fn resolve_public_id(&self, kind: &str, handle: &str) -> String {
        let op = match kind.to_ascii_lowercase().as_str() {
            "person" => ApiOperation::GetPerson,
            "family" => ApiOperation::GetFamily,
            "event" => ApiOperation::GetEvent,
            "place" => ApiOperation::GetPlace,
            "source" => ApiOperation::GetSource,
            "citation" => ApiOperation::GetCitation,
            "media" => ApiOperation::GetMediaItem,
            "note" => ApiOperation::GetNote,
            "repository" => ApiOperation::GetRepository,
            _ => return handle.to_string(),
        };

        let mut targets = BTreeMap::new();
        targets.insert("handle".to_string(), handle.to_string());

        match self.client.dispatch(op, None, &targets).await {
            Ok(body) => body
                .get("gramps_id")
                .and_then(Value::as_str)
                .map_or_else(|| handle.to_string(), str::to_string),
            Err(_) => handle.to_string(),
        }
    }

    /// Release the session's transport and cached credential.
    pub async fn close(&self) {
        self.client.session().close().await;
    }
}
