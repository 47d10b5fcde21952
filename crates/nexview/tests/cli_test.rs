//! Integration tests for the `nexview` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling, and error exit codes. None need a live server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `nexview` binary with env isolation.
///
/// Clears all `NEXVIEW_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn nexview_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nexview");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("NEXVIEW_HOST")
        .env_remove("NEXVIEW_PORT")
        .env_remove("NEXVIEW_OUTPUT")
        .env_remove("NEXVIEW_INSECURE")
        .env_remove("NEXVIEW_TIMEOUT")
        .env_remove("NEXVIEW_LOG_FILE")
        .env_remove("NEXVIEW_USERNAME")
        .env_remove("NEXVIEW_TOKEN");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn config_file(home: &Path) -> PathBuf {
    let output = nexview_cmd(home).args(["config", "path"]).output().unwrap();
    PathBuf::from(String::from_utf8_lossy(&output.stdout).trim())
}

/// A localhost port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = nexview_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("telemetry")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("players"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nexview"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nexview"));
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_player_rejects_unknown_action() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["player", "spotify", "rewind"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown action"));
}

#[test]
fn test_weather_without_location() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .arg("weather")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("location"));
}

// ── Not logged in ───────────────────────────────────────────────────

#[test]
fn test_stats_without_login() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .arg("stats")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_requires_host() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["login", "-u", "admin", "--password-stdin"])
        .write_stdin("hunter2\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_stats_times_out_when_server_unreachable() {
    let home = tempfile::tempdir().unwrap();
    let port = closed_port().to_string();
    let output = nexview_cmd(home.path())
        .env("NEXVIEW_TOKEN", "abc")
        .args(["stats", "--host", "127.0.0.1", "--port", &port, "--timeout", "1", "-q"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    let text = combined_output(&output);
    assert!(text.contains("No telemetry"), "unexpected output:\n{text}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_config_dir() {
    let home = tempfile::tempdir().unwrap();
    let path = config_file(home.path());
    assert!(path.ends_with("config.toml"), "{}", path.display());
    assert!(path.starts_with(home.path()), "{}", path.display());
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["config", "set", "server.host", "pi.local"])
        .assert()
        .success();
    nexview_cmd(home.path())
        .args(["config", "set", "weather.latitude", "-33.9"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(config_file(home.path())).unwrap();
    assert!(saved.contains("pi.local"), "{saved}");

    let output = nexview_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["server"]["host"], "pi.local");
    assert_eq!(shown["server"]["port"], 9384);
    assert_eq!(shown["weather"]["latitude"], -33.9);
}

#[test]
fn test_config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["config", "set", "server.colour", "blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_set_rejects_backoff_below_delay() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["config", "set", "session.max_reconnect_delay_secs", "1"])
        .assert()
        .code(2);
    assert!(!config_file(home.path()).exists());
}

#[test]
fn test_logout_clears_saved_server() {
    let home = tempfile::tempdir().unwrap();
    nexview_cmd(home.path())
        .args(["config", "set", "server.host", "pi.local"])
        .assert()
        .success();
    nexview_cmd(home.path()).arg("logout").assert().success();

    let saved = std::fs::read_to_string(config_file(home.path())).unwrap();
    assert!(!saved.contains("pi.local"), "{saved}");
}

// ── Login ───────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_login_saves_endpoint() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "abc" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let port = server.address().port().to_string();
    let home = tempfile::tempdir().unwrap();
    let home_path = home.path().to_owned();
    let output = tokio::task::spawn_blocking(move || {
        nexview_cmd(&home_path)
            .args(["login", "--host", "127.0.0.1", "--port", &port])
            .args(["-u", "admin", "--password-stdin"])
            .write_stdin("hunter2\n")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    let text = combined_output(&output);
    assert!(output.status.success(), "login failed:\n{text}");
    assert!(text.contains("Logged in to 127.0.0.1"), "{text}");

    let saved = std::fs::read_to_string(config_file(home.path())).unwrap();
    assert!(saved.contains("127.0.0.1"), "{saved}");
    assert!(saved.contains("admin"), "{saved}");
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let port = server.address().port().to_string();
    let home = tempfile::tempdir().unwrap();
    let home_path = home.path().to_owned();
    let output = tokio::task::spawn_blocking(move || {
        nexview_cmd(&home_path)
            .args(["login", "--host", "127.0.0.1", "--port", &port])
            .args(["-u", "admin", "--password-stdin"])
            .write_stdin("wrong\n")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(!config_file(home.path()).exists());
}
