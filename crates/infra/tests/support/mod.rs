//! Shared helpers for infrastructure integration tests
#![allow(dead_code)] // each suite uses a different subset of helpers

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rootline_domain::{Config, PollingConfig, ServiceConfig};
use rootline_infra::{Session, TreeClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at a mock server.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        service: ServiceConfig {
            api_url: server.uri(),
            username: "owner".to_string(),
            password: "secret".to_string(),
            tree_id: "default".to_string(),
        },
        polling: PollingConfig::default(),
    }
}

/// Dispatcher with a fresh session, both bound to the mock server.
pub fn client_for(server: &MockServer) -> TreeClient {
    let config = config_for(server);
    let session = Arc::new(Session::new(config.service.clone()));
    TreeClient::new(config, session)
}

/// Unsigned JWT whose payload carries the given expiry claim.
pub fn jwt_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"exp": exp}).to_string().as_bytes());
    format!("{header}.{payload}.sig")
}

/// Token that stays valid for the duration of a test.
pub fn fresh_token() -> String {
    jwt_expiring_at((Utc::now() + Duration::hours(1)).timestamp())
}

/// Mount a token endpoint that always succeeds with a fresh token.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": fresh_token()})),
        )
        .mount(server)
        .await;
}

/// Number of requests the server saw for the token endpoint.
pub async fn token_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/token/")
        .count()
}
