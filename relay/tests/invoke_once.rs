use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const EVENT: &str = r#"{
    "headers": {"Things-Message-Token": "deadbeef", "Content-Type": "application/json"},
    "body": "[{\"n\":\"temperature\",\"v\":21.5}]"
}"#;

fn relay() -> Command {
    let mut cmd = Command::cargo_bin("things-relay").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("RELAY_EVENT")
        .env_remove("KPN_SHARED_SECRET")
        // never reached by these tests
        .env("RELAY_API_ENDPOINT", "http://127.0.0.1:9")
        .env("ARDUINO_CLIENT_ID", "client-id")
        .env("ARDUINO_CLIENT_SECRET", "client-secret")
        .env("ARDUINO_THING_ID", "thing-1")
        .env("ARDUINO_PROPERTY_ID", "prop-1");
    cmd
}

#[test]
fn missing_configuration_is_reported_in_the_response() {
    let dir = tempdir().expect("failed to create temp dir for test");
    let event = dir.path().join("event.json");
    fs::write(&event, EVENT).unwrap();

    let mut cmd = relay();
    cmd.env_remove("ARDUINO_THING_ID")
        .arg("--event")
        .arg(&event);

    cmd.assert().success().stdout(predicate::str::contains(
        r#"{"statusCode":500,"body":"Configuration error: Missing ARDUINO_THING_ID"}"#,
    ));
}

#[test]
fn wrong_token_is_unauthorized() {
    let dir = tempdir().expect("failed to create temp dir for test");
    let event = dir.path().join("event.json");
    fs::write(&event, EVENT).unwrap();

    let mut cmd = relay();
    cmd.env("KPN_SHARED_SECRET", "s3cr3t")
        .arg("--event")
        .arg(&event);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#"{"statusCode":401,"body":"Unauthorized"}"#));
}

#[test]
fn event_is_read_from_stdin() {
    let mut cmd = relay();
    cmd.env("KPN_SHARED_SECRET", "s3cr3t")
        .args(["--event", "-"])
        .write_stdin(EVENT);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode":401"#));
}

#[test]
fn unreadable_event_fails_the_process() {
    let dir = tempdir().expect("failed to create temp dir for test");
    let event = dir.path().join("event.json");
    fs::write(&event, "not an event").unwrap();

    let mut cmd = relay();
    cmd.arg("--event").arg(&event);

    cmd.assert().failure();
}
