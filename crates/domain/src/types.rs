//! Domain types and models

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::constants::DEFAULT_TOKEN_LIFETIME_MINS;

/// A JSON object as returned by the tree service.
pub type Record = serde_json::Map<String, Value>;

/// Bearer credential issued by the token endpoint.
///
/// Replaced wholesale on every re-authentication; never partially mutated.
#[derive(Clone)]
pub struct Credential {
    /// Opaque bearer token presented on each request.
    pub token: String,
    /// Expiry instant; requests are only sent while `now < expires_at`.
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a token and an optional expiry claim.
    ///
    /// When the token carries no usable expiry, a conservative 15-minute
    /// lifetime is assumed.
    #[must_use]
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        let expires_at = expires_at
            .unwrap_or_else(|| Utc::now() + Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINS));
        Self { token, expires_at }
    }

    /// Whether the credential must be replaced before the next request.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the raw token.
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
