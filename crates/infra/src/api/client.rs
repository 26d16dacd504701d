//! Unified request dispatcher for the tree service API
//!
//! One [`TreeClient`] executes every logical operation: it resolves the
//! operation's path template, attaches a valid bearer token, sends the
//! request, and normalizes the outcome. The single retry it owns is the
//! one-shot re-authentication on a 401; every other failure propagates on
//! first occurrence.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use rootline_core::poll::TaskStatusSource;
use rootline_core::{merge_update, ApiOperation, HttpMethod};
use rootline_domain::{Config, Record, RemoteFailureKind, Result, RootlineError};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::{classify_send_error, ContextId};
use crate::session::Session;

/// Placeholder for the default collection, filled from configuration when
/// the caller does not supply it.
const TREE_ID_PARAM: &str = "tree_id";

/// Unified async client for all tree service operations.
pub struct TreeClient {
    session: Arc<Session>,
    config: Config,
    context: ContextId,
    base_url: String,
}

impl TreeClient {
    /// Create a dispatcher bound to its own scheduling context.
    #[must_use]
    pub fn new(config: Config, session: Arc<Session>) -> Self {
        let base_url = config.service.api_base();
        Self { session, config, context: ContextId::next(), base_url }
    }

    /// The session shared with other collaborators.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Execute one logical operation and return the response body.
    ///
    /// # Errors
    /// See [`TreeClient::dispatch_with_headers`].
    pub async fn dispatch(
        &self,
        op: ApiOperation,
        params: Option<Record>,
        targets: &BTreeMap<String, String>,
    ) -> Result<Value> {
        self.dispatch_with_headers(op, params, targets).await.map(|(body, _)| body)
    }

    /// Execute one logical operation and return the response body together
    /// with the response headers (for out-of-band values such as the
    /// total-count header on list endpoints).
    ///
    /// # Errors
    /// - `MissingPathParameter` before any network call when a template
    ///   placeholder is unfilled.
    /// - `AuthenticationFailed` when a second 401 follows the one forced
    ///   re-authentication.
    /// - `ServiceUnreachable` / `RequestTimeout` for transport failures.
    /// - `RemoteOperationFailed` for any other non-2xx status.
    pub async fn dispatch_with_headers(
        &self,
        op: ApiOperation,
        params: Option<Record>,
        targets: &BTreeMap<String, String>,
    ) -> Result<(Value, HeaderMap)> {
        let path = self.resolve_path(op, targets)?;
        let method = to_reqwest_method(op.method());

        let (query, mut body) =
            if op.sends_body() { (None, params) } else { (params, None) };

        // Update endpoints replace the full resource; reconcile first so
        // omitted fields survive and list fields union instead of clobber.
        if op.is_update() {
            if let Some(incoming) = body.take() {
                body = Some(self.reconcile_update(&path, incoming).await?);
            }
        }

        let response =
            self.execute(method, &path, query.as_ref(), body.as_ref()).await?;
        handle_response(response).await
    }

    /// Upload raw media content with its own content type.
    ///
    /// The body is not buffered for replay, so this path has no 401 retry.
    ///
    /// # Errors
    /// Same taxonomy as [`TreeClient::dispatch_with_headers`], minus the
    /// retry behavior.
    pub async fn upload_media(&self, content: Vec<u8>, mime_type: &str) -> Result<Value> {
        let token = self.session.valid_token(self.context).await?;
        let client = self.session.client(self.context).await?;
        let url = format!("{}/media/", self.base_url);

        debug!(mime_type, bytes = content.len(), "uploading media file");
        let response = client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, mime_type)
            .body(content)
            .send()
            .await
            .map_err(classify_send_error)?;

        let (body, _) = handle_response(response).await?;
        Ok(body)
    }

    /// Fill the default collection id when the template asks for it.
    fn resolve_path(
        &self,
        op: ApiOperation,
        targets: &BTreeMap<String, String>,
    ) -> Result<String> {
        if op.endpoint().contains("{tree_id}") && !targets.contains_key(TREE_ID_PARAM) {
            let mut with_tree = targets.clone();
            with_tree
                .insert(TREE_ID_PARAM.to_string(), self.config.service.tree_id.clone());
            op.resolve_path(&with_tree)
        } else {
            op.resolve_path(targets)
        }
    }

    /// Fetch the current representation and merge the incoming fields.
    ///
    /// An empty (or non-object) fetch result means there is nothing to
    /// merge against; the incoming fields are sent unchanged.
    async fn reconcile_update(&self, path: &str, incoming: Record) -> Result<Record> {
        let response = self.execute(Method::GET, path, None, None).await?;
        let (existing, _) = handle_response(response).await?;

        match existing {
            Value::Object(map) if !map.is_empty() => Ok(merge_update(&map, incoming)),
            _ => Ok(incoming),
        }
    }

    /// Send one request, retrying exactly once after a 401.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&Record>,
        body: Option<&Record>,
    ) -> Result<reqwest::Response> {
        let correlation_id = Uuid::new_v4();
        let url = format!("{}/{}", self.base_url, path);
        let mut token = self.session.valid_token(self.context).await?;

        for attempt in 0u8..2 {
            let client = self.session.client(self.context).await?;
            let mut request = client
                .request(method.clone(), &url)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(params) = query {
                request = request.query(&query_pairs(params));
            }
            if let Some(record) = body {
                request = request.json(record);
            }

            debug!(%correlation_id, %method, path, attempt, "sending tree service request");
            let response = request.send().await.map_err(classify_send_error)?;
            let status = response.status();
            debug!(%correlation_id, status = status.as_u16(), "received tree service response");

            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                warn!(%correlation_id, "got 401, refreshing token and retrying");
                token = self.session.refresh_token(self.context).await?;
                continue;
            }
            return Ok(response);
        }

        Err(RootlineError::Internal("request loop ended without a response".to_string()))
    }
}

#[async_trait]
impl TaskStatusSource for TreeClient {
    async fn task_status(&self, task_id: &str) -> Result<Record> {
        let mut targets = BTreeMap::new();
        targets.insert("task_id".to_string(), task_id.to_string());

        let status = self.dispatch(ApiOperation::GetTaskStatus, None, &targets).await?;
        match status {
            Value::Object(map) => Ok(map),
            other => Err(RootlineError::Internal(format!(
                "task status response was not an object: {other}"
            ))),
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Normalize a response into a JSON body plus headers.
///
/// An empty body is an empty record, not an error. A non-empty body that
/// fails to parse is returned as a sentinel record rather than raised so
/// callers can inspect the raw content.
async fn handle_response(response: reqwest::Response) -> Result<(Value, HeaderMap)> {
    let status = response.status();
    let headers = response.headers().clone();

    if status == StatusCode::UNAUTHORIZED {
        // Only reachable after the one forced re-authentication.
        return Err(RootlineError::AuthenticationFailed);
    }
    if !status.is_success() {
        return Err(RootlineError::RemoteOperationFailed {
            status: status.as_u16(),
            kind: RemoteFailureKind::from_status(status.as_u16()),
        });
    }

    let text = response.text().await.map_err(classify_send_error)?;
    if text.trim().is_empty() {
        return Ok((Value::Object(Record::new()), headers));
    }

    match serde_json::from_str(&text) {
        Ok(value) => Ok((value, headers)),
        Err(error) => {
            warn!(%error, "failed to parse JSON response");
            let mut sentinel = Record::new();
            sentinel.insert("error".to_string(), Value::String("Invalid JSON response".to_string()));
            sentinel.insert("raw_content".to_string(), Value::String(text));
            Ok((Value::Object(sentinel), headers))
        }
    }
}

/// Render query parameters as flat key/value pairs.
///
/// Scalars render directly, nulls are omitted, and structured values are
/// carried as compact JSON (the report-options parameter travels this way).
fn query_pairs(params: &Record) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}
