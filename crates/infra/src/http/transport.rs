use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rootline_domain::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use rootline_domain::{Result, RootlineError};

/// Identity of the cooperative-scheduling context that owns a transport.
///
/// A connection pool must never be reused across two scheduling contexts;
/// each owner (dispatcher, gateway) mints one id at construction and
/// presents it on every transport access, and a mismatch forces a rebuild.
/// Rebuilding on mismatch is pessimistic: occasionally a still-usable pool
/// is discarded, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextId(u64);

impl ContextId {
    /// Mint a fresh context identity.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Connection pool stamped with its owning scheduling context.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    context: ContextId,
}

impl Transport {
    /// Start building a new transport.
    #[must_use]
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// The underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The scheduling context this transport was built under.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }
}

/// Builder for [`Transport`].
#[derive(Debug)]
pub struct TransportBuilder {
    timeout: Duration,
    connect_timeout: Duration,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

impl TransportBuilder {
    /// Override the total request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the connection-establishment timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build a transport owned by the given scheduling context.
    ///
    /// # Errors
    /// Returns `RootlineError::Internal` when the underlying client cannot
    /// be constructed.
    pub fn build(self, context: ContextId) -> Result<Transport> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .no_proxy()
            .build()
            .map_err(|e| RootlineError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Transport { client, context })
    }
}

/// Classify a transport-level send failure into the error taxonomy.
///
/// Connection failures and timeouts are distinct kinds; anything else the
/// transport reports is an adapter-internal condition.
pub(crate) fn classify_send_error(error: reqwest::Error) -> RootlineError {
    if error.is_timeout() {
        RootlineError::RequestTimeout(error.to_string())
    } else if error.is_connect() {
        RootlineError::ServiceUnreachable(error.to_string())
    } else {
        RootlineError::Internal(format!("unexpected transport error: {error}"))
    }
}
