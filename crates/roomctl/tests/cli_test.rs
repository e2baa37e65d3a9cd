//! Integration tests for the `roomctl` binary.
//!
//! Argument parsing, help, completions and error exits run without a
//! server; the remaining cases drive the binary against a mocked one.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const ISOLATED_HOME: &str = "/tmp/roomctl-cli-test-nonexistent";

/// Build a command for the `roomctl` binary with env isolation.
///
/// Clears all `ROOMCTL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn roomctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("roomctl");
    cmd.env("HOME", ISOLATED_HOME)
        .env("XDG_CONFIG_HOME", ISOLATED_HOME)
        .env_remove("ROOMCTL_PROFILE")
        .env_remove("ROOMCTL_URL")
        .env_remove("ROOMCTL_USERNAME")
        .env_remove("ROOMCTL_PASSWORD")
        .env_remove("ROOMCTL_OUTPUT")
        .env_remove("ROOMCTL_INSECURE")
        .env_remove("ROOMCTL_TIMEOUT")
        .env_remove("ROOMCTL_DEFAULT_PROFILE");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn room_json(id: &str, name: &str, running: bool) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("http://rooms.local/{name}/"),
        "name": name,
        "neko_image": "m1k1o/neko:firefox",
        "is_outdated": false,
        "max_connections": 10,
        "running": running,
        "paused": false,
        "is_ready": running,
        "status": if running { "Up 3 minutes" } else { "Exited (0)" },
        "created": "2024-05-01T10:00:00Z",
        "labels": {}
    })
}

/// Mount the two endpoints every connect loads.
async fn mock_server(rooms: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connections": 100,
            "neko_images": ["m1k1o/neko:firefox", "m1k1o/neko:chromium"],
            "storage_enabled": true,
            "uses_mux": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rooms))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = roomctl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    roomctl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("rooms")
            .and(predicate::str::contains("pull"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    roomctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("roomctl"));
}

#[test]
fn test_completions_zsh() {
    roomctl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    roomctl_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = roomctl_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("foobar") || text.contains("unrecognized"), "{text}");
}

#[test]
fn test_rooms_list_without_server() {
    roomctl_cmd()
        .args(["rooms", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No room server configured"));
}

#[test]
fn test_unknown_profile() {
    roomctl_cmd()
        .args(["--profile", "nope", "rooms", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'nope' not found"));
}

#[test]
fn test_create_requires_name_and_image() {
    roomctl_cmd()
        .args(["--url", "http://127.0.0.1:9", "rooms", "create", "--name", "lobby"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--image"));
}

#[test]
fn test_config_path() {
    roomctl_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_profiles_empty() {
    roomctl_cmd()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_file_profile_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("roomctl");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "default_profile = \"lab\"\n\n[profiles.lab]\nurl = \"https://rooms.lab\"\n",
    )
    .unwrap();

    roomctl_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *"));
}

// ── Against a mocked server ─────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_list_json() {
    let server = mock_server(json!([
        room_json("a1b2c3d4e5f6a7b8", "lobby", true),
        room_json("ffffeeeeddddcccc", "standup", false)
    ]))
    .await;

    let output = roomctl_cmd()
        .args(["--url", &server.uri(), "-o", "json", "rooms", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let rooms: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = rooms
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["lobby", "standup"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_list_state_filter_plain() {
    let server = mock_server(json!([
        room_json("a1b2c3d4e5f6a7b8", "lobby", true),
        room_json("ffffeeeeddddcccc", "standup", false)
    ]))
    .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "-o", "plain", "rooms", "list", "--state", "stopped"])
        .assert()
        .success()
        .stdout("ffffeeeeddddcccc\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_start_by_name() {
    let server = mock_server(json!([room_json("ffffeeeeddddcccc", "standup", false)])).await;
    Mock::given(method("POST"))
        .and(path("/api/rooms/ffffeeeeddddcccc/start"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "rooms", "start", "standup"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Room 'standup' started"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_get_unknown_room() {
    let server = mock_server(json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/ghost/by-name"))
        .respond_with(ResponseTemplate::new(404).set_body_string("room not found"))
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "rooms", "get", "ghost"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("room 'ghost' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_requires_yes_when_not_interactive() {
    let server = mock_server(json!([room_json("a1b2c3d4e5f6a7b8", "lobby", true)])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/rooms/a1b2c3d4e5f6a7b8"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "rooms", "remove", "lobby"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compose_prints_server_yaml() {
    let server = mock_server(json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/docker-compose.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("services:\n  lobby: {}\n"))
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "rooms", "compose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("services:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_reports_rejected_subscription() {
    let server = mock_server(json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "watch"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Event stream unavailable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_room_name_with_query_characters_is_not_rerouted() {
    let server = mock_server(json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/lobby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_json("wrongroom000", "lobby", true)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/lobby%3Fx/by-name"))
        .respond_with(ResponseTemplate::new(404).set_body_string("room not found"))
        .expect(1)
        .mount(&server)
        .await;

    roomctl_cmd()
        .args(["--url", &server.uri(), "rooms", "get", "lobby?x"])
        .assert()
        .code(4);
}
