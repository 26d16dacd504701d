//! Integration tests for asynchronous report generation
//!
//! A report request that is accepted asynchronously hands back a task id;
//! the poller drives the task-status resource to a terminal state through
//! the real dispatcher.

mod support;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rootline_core::poll::{wait_for_task, PollConfig};
use rootline_core::ApiOperation;
use rootline_domain::{Record, RootlineError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{client_for, mount_token_endpoint};

fn fast_config() -> PollConfig {
    PollConfig {
        initial_interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(10),
        backoff_factor: 1.5,
        timeout: Duration::from_millis(200),
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other:?}"),
    }
}

#[tokio::test]
async fn accepted_report_polls_task_to_completion() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/reports/descend_report/file"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task": {"id": "abc"}})))
        .expect(1)
        .mount(&server)
        .await;

    let polls = Arc::new(AtomicUsize::new(0));
    let polls_clone = polls.clone();
    Mock::given(method("GET"))
        .and(path("/api/tasks/abc/"))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if polls_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(200).set_body_json(json!({"state": "RUNNING"}))
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "state": "SUCCESS",
                    "result_object": {"file_name": "r.html"},
                }))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut targets = BTreeMap::new();
    targets.insert("report_id".to_string(), "descend_report".to_string());
    let options = record(json!({"options": json!({"pid": "I0001", "off": "html"}).to_string()}));

    let accepted = client
        .dispatch(ApiOperation::PostReportFile, Some(options), &targets)
        .await
        .unwrap();
    let task_id = accepted["task"]["id"].as_str().unwrap();

    let result = wait_for_task(&client, task_id, &fast_config()).await.unwrap();
    assert_eq!(result, json!({"file_name": "r.html"}));
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn report_options_travel_as_query_parameters() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let options_json = json!({"pid": "I0001", "off": "html"}).to_string();
    Mock::given(method("POST"))
        .and(path("/api/reports/descend_report/file"))
        .and(query_param("options", options_json.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_name": "r.html"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut targets = BTreeMap::new();
    targets.insert("report_id".to_string(), "descend_report".to_string());
    let params = record(json!({"options": options_json}));

    let body =
        client.dispatch(ApiOperation::PostReportFile, Some(params), &targets).await.unwrap();
    assert_eq!(body["file_name"], json!("r.html"));
}

#[tokio::test]
async fn failed_task_stops_polling_with_server_detail() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/abc/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"state": "FAILURE", "info": "disk full"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = wait_for_task(&client, "abc", &fast_config()).await.unwrap_err();

    match err {
        RootlineError::TaskFailed(info) => assert_eq!(info, "disk full"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn perpetually_running_task_times_out() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/abc/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "RUNNING"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = wait_for_task(&client, "abc", &fast_config()).await.unwrap_err();

    assert!(matches!(err, RootlineError::TaskTimeout { .. }));
}
