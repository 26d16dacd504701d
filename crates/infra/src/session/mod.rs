//! Session management for the tree service
//!
//! The session owns the two pieces of shared mutable state in the
//! execution core: the bearer credential and the HTTP transport. Both are
//! replaced wholesale, never partially mutated. A session is explicitly
//! constructed and passed (`Arc<Session>`) to every collaborator; there is
//! no process-wide instance.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rootline_domain::constants::TOKEN_ENDPOINT;
use rootline_domain::{Credential, RemoteFailureKind, Result, RootlineError, ServiceConfig};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::http::{classify_send_error, ContextId, Transport};

/// Owns the bearer credential and the HTTP transport for one service.
///
/// Every outbound request obtains its token through [`Session::valid_token`]
/// and its client through [`Session::client`]; expiry and scheduling-context
/// mismatches are handled transparently by those accessors.
pub struct Session {
    config: ServiceConfig,
    credential: RwLock<Option<Credential>>,
    transport: RwLock<Option<Transport>>,
    /// Collapses concurrent refresh attempts into one token request.
    refresh_gate: Mutex<()>,
}

impl Session {
    /// Create a session for the configured service.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            credential: RwLock::new(None),
            transport: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The service configuration this session authenticates against.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get an HTTP client valid for the caller's scheduling context.
    ///
    /// Builds a new transport when none exists or when the stored handle
    /// was created under a different context. The replaced handle is
    /// dropped without being explicitly closed.
    ///
    /// # Errors
    /// Returns `RootlineError::Internal` when the client cannot be built.
    pub async fn client(&self, ctx: ContextId) -> Result<reqwest::Client> {
        if let Some(transport) = self.transport.read().await.as_ref() {
            if transport.context() == ctx {
                return Ok(transport.client().clone());
            }
        }

        let mut slot = self.transport.write().await;
        // Re-check under the write lock; another caller may have rebuilt.
        if let Some(transport) = slot.as_ref() {
            if transport.context() == ctx {
                return Ok(transport.client().clone());
            }
            info!("transport rebuilt due to scheduling context change");
        } else {
            debug!("transport created");
        }

        let transport = Transport::builder().build(ctx)?;
        let client = transport.client().clone();
        *slot = Some(transport);
        Ok(client)
    }

    /// Get a valid bearer token, authenticating first when the cached
    /// credential is missing or expired.
    ///
    /// # Errors
    /// Propagates authentication failures (`InvalidCredentials`,
    /// `ServiceUnreachable`, …).
    pub async fn valid_token(&self, ctx: ContextId) -> Result<String> {
        if let Some(credential) = self.credential.read().await.as_ref() {
            if !credential.is_expired(Utc::now()) {
                return Ok(credential.token.clone());
            }
        }
        self.refresh(ctx, false).await
    }

    /// Discard the cached credential and authenticate again.
    ///
    /// Used by the dispatcher's one-shot 401 retry; a token the service
    /// just rejected must not be served from cache.
    ///
    /// # Errors
    /// Propagates authentication failures.
    pub async fn refresh_token(&self, ctx: ContextId) -> Result<String> {
        self.refresh(ctx, true).await
    }

    /// Single-flight refresh: concurrent callers that observed an expired
    /// credential collapse into one token request.
    async fn refresh(&self, ctx: ContextId, force: bool) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        if !force {
            // Another caller may have refreshed while we waited on the gate.
            if let Some(credential) = self.credential.read().await.as_ref() {
                if !credential.is_expired(Utc::now()) {
                    return Ok(credential.token.clone());
                }
            }
        }

        let credential = self.authenticate(ctx).await?;
        let token = credential.token.clone();
        *self.credential.write().await = Some(credential);
        Ok(token)
    }

    /// Authenticate with the token endpoint and build a credential.
    async fn authenticate(&self, ctx: ContextId) -> Result<Credential> {
        let client = self.client(ctx).await?;
        let url = format!("{}/{}", self.config.api_base(), TOKEN_ENDPOINT);

        let response = client
            .post(&url)
            .json(&json!({
                "username": self.config.username,
                "password": self.config.password,
            }))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RootlineError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(RootlineError::RemoteOperationFailed {
                status: status.as_u16(),
                kind: RemoteFailureKind::from_status(status.as_u16()),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            RootlineError::Internal(format!("failed to parse token response: {e}"))
        })?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RootlineError::Internal("token response missing access_token".to_string())
            })?
            .to_string();

        let expires_at = decode_expiry(&token);
        if expires_at.is_none() {
            debug!("token carries no usable expiry claim, assuming default lifetime");
        }

        info!("authenticated with tree service");
        Ok(Credential::new(token, expires_at))
    }

    /// Release the transport and clear cached state. Idempotent.
    pub async fn close(&self) {
        *self.credential.write().await = None;
        *self.transport.write().await = None;
        debug!("session closed");
    }
}

/// Read the unverified expiry claim from a JWT-shaped token.
///
/// The token is treated as an opaque string plus a signed expiry hint;
/// signature verification is the remote service's job. Any deviation from
/// the expected shape yields `None` and the caller falls back to the
/// default lifetime.
fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    let expires_at = DateTime::from_timestamp(exp, 0);
    if expires_at.is_none() {
        warn!(exp, "token expiry claim out of range");
    }
    expires_at
}
