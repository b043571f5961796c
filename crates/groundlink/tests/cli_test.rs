//! Integration tests for the `groundlink` CLI binary.
//!
//! Replays run with in-memory settings and config directories pointed at a
//! nonexistent path so tests never touch the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

fn groundlink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("groundlink");
    cmd.env("HOME", "/tmp/groundlink-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/groundlink-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/groundlink-cli-test-nonexistent")
        .env_remove("GROUNDLINK_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("script.json");
    std::fs::write(&path, body).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = groundlink_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "Expected 'Usage' in output:\n{stderr}");
}

#[test]
fn test_help_lists_commands() {
    groundlink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("replay")
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_completions_bash() {
    groundlink_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("groundlink"));
}

#[test]
fn test_config_path() {
    groundlink_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    groundlink_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("offline_settings = true")
                .and(predicate::str::contains("auto_landing_critical_delay_secs = 3")),
        );
}

// ── Replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_plain_output() {
    groundlink_cmd()
        .arg("replay")
        .arg(fixture("session.json"))
        .arg("--ephemeral")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("PI040416AA0000 name \"ANAFI-0000\"")
                .and(predicate::str::contains("\"request\":\"connect\""))
                .and(predicate::str::contains("\"connection_state\":\"connected\""))
                .and(predicate::str::contains("\"level\":80"))
                .and(predicate::str::contains(
                    "PI040416AA0000 transport {\"command\":\"take_off\"}",
                ))
                .and(predicate::str::contains("PI040416AA0000 battery_info -"))
                .and(predicate::str::contains("\"connection_state_cause\":\"connection_lost\"")),
        );
}

#[test]
fn test_replay_json_lines() {
    let output = groundlink_cmd()
        .args(["--output", "json", "replay"])
        .arg(fixture("session.json"))
        .arg("--ephemeral")
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(lines.iter().all(|l| l["device"] == "PI040416AA0000"));
    assert!(lines.iter().any(|l| {
        l["source"] == "manual_copter" && l["value"]["state"] == "active"
    }));
    assert!(lines.iter().any(|l| l["source"] == "alarms" && l["value"].is_object()));
}

#[test]
fn test_replay_persists_known_devices() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.json");

    groundlink_cmd()
        .arg("replay")
        .arg(fixture("session.json"))
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success();

    let stored = std::fs::read_to_string(&settings).unwrap();
    assert!(stored.contains("PI040416AA0000"));
    assert!(stored.contains("anafi4k"));

    let script = write_script(&dir, r#"{"steps": []}"#);
    groundlink_cmd()
        .arg("replay")
        .arg(&script)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"can_be_forgotten\":true"));
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_missing_script_fails() {
    groundlink_cmd()
        .args(["replay", "/nonexistent/script.json", "--ephemeral"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot read script"));
}

#[test]
fn test_malformed_script_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, r#"{"steps": [{"op": "teleport", "uid": "X"}]}"#);

    groundlink_cmd()
        .arg("replay")
        .arg(&script)
        .arg("--ephemeral")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid session script"));
}

#[test]
fn test_unknown_device_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, r#"{"steps": [{"op": "link_connected", "uid": "GHOST"}]}"#);

    groundlink_cmd()
        .arg("replay")
        .arg(&script)
        .arg("--ephemeral")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("GHOST"));
}
