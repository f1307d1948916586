//! End-to-end tests for the feedback command.

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_feedback_requires_a_direction() {
    Command::cargo_bin("mcpchat")
        .unwrap()
        .args(["feedback", "s1", "m1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--up"));
}

#[test]
fn test_feedback_directions_conflict() {
    Command::cargo_bin("mcpchat")
        .unwrap()
        .args(["feedback", "s1", "m1", "--up", "--down"])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_feedback_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "s1",
            "name": "Chat",
            "lastActivity": "2026-08-29T10:00:00Z",
            "messages": [{
                "id": "m2",
                "role": "assistant",
                "content": "answer",
                "timestamp": "2026-08-29T10:00:00Z"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .and(body_json(serde_json::json!({
            "sessionId": "s1",
            "messageId": "m2",
            "liked": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": {
                "id": "m2",
                "role": "assistant",
                "content": "answer",
                "timestamp": "2026-08-29T10:00:00Z",
                "liked": false
            }
        })))
        .mount(&server)
        .await;

    let base_url = format!("{}/api", server.uri());
    // The binary is a blocking child process; keep the mock server's
    // runtime workers free while we wait on it.
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("mcpchat")
            .unwrap()
            .env("MCPCHAT_BASE_URL", base_url)
            .args(["feedback", "s1", "m2", "--down"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[-1] m2"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_feedback_unknown_message_fails_before_posting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "s1",
            "name": "Chat",
            "lastActivity": "2026-08-29T10:00:00Z",
            "messages": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let base_url = format!("{}/api", server.uri());
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("mcpchat")
            .unwrap()
            .env("MCPCHAT_BASE_URL", base_url)
            .args(["feedback", "s1", "missing", "--up"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No message missing"));
    })
    .await
    .unwrap();
}
