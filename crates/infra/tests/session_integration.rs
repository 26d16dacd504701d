//! Integration tests for the session manager
//!
//! Covers credential caching, expiry-triggered refresh, single-flight
//! collapse of concurrent refreshes, and authentication error mapping.

mod support;

use std::net::TcpListener;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rootline_domain::{RootlineError, ServiceConfig};
use rootline_infra::{ContextId, Session};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{config_for, jwt_expiring_at, mount_token_endpoint, token_requests};

#[tokio::test]
async fn token_is_cached_while_fresh() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let session = Session::new(config_for(&server).service);
    let ctx = ContextId::next();

    let first = session.valid_token(ctx).await.unwrap();
    let second = session.valid_token(ctx).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn expired_token_triggers_reauthentication() {
    let server = MockServer::start().await;
    let expired = jwt_expiring_at((Utc::now() - Duration::minutes(1)).timestamp());
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": expired})))
        .mount(&server)
        .await;

    let session = Session::new(config_for(&server).service);
    let ctx = ContextId::next();

    // Every issued token is already expired, so every call authenticates.
    session.valid_token(ctx).await.unwrap();
    session.valid_token(ctx).await.unwrap();

    assert_eq!(token_requests(&server).await, 2);
}

#[tokio::test]
async fn opaque_token_gets_default_lifetime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "opaque-token"})),
        )
        .mount(&server)
        .await;

    let session = Session::new(config_for(&server).service);
    let ctx = ContextId::next();

    // No expiry claim: the conservative default keeps the token cached.
    session.valid_token(ctx).await.unwrap();
    session.valid_token(ctx).await.unwrap();

    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn concurrent_first_use_collapses_into_one_authentication() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let session = Arc::new(Session::new(config_for(&server).service));
    let ctx = ContextId::next();

    let (a, b) = tokio::join!(session.valid_token(ctx), session.valid_token(ctx));
    assert_eq!(a.unwrap(), b.unwrap());

    // Both callers observed a missing credential; only one authenticated.
    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn authentication_sends_configured_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({"username": "owner", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "opaque-token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(config_for(&server).service);
    session.valid_token(ContextId::next()).await.unwrap();
}

#[tokio::test]
async fn rejected_credentials_map_to_invalid_credentials() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token/"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let session = Session::new(config_for(&server).service);
        let err = session.valid_token(ContextId::next()).await.unwrap_err();
        assert!(matches!(err, RootlineError::InvalidCredentials), "status {status}");
    }
}

#[tokio::test]
async fn unreachable_service_maps_to_service_unreachable() {
    // Bind and immediately release a port so connections are refused.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = Session::new(ServiceConfig {
        api_url: format!("http://{addr}"),
        username: "owner".to_string(),
        password: "secret".to_string(),
        tree_id: "default".to_string(),
    });

    let err = session.valid_token(ContextId::next()).await.unwrap_err();
    assert!(matches!(err, RootlineError::ServiceUnreachable(_)));
}

#[tokio::test]
async fn close_clears_cached_credential() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let session = Session::new(config_for(&server).service);
    let ctx = ContextId::next();

    session.valid_token(ctx).await.unwrap();
    session.close().await;
    session.valid_token(ctx).await.unwrap();

    // The credential did not survive the close.
    assert_eq!(token_requests(&server).await, 2);
}
