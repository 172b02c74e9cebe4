//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Sample configuration output
//! - Configuration validation
//! - Single-cycle collection output and failures

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the beat-exporter binary
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd =
        Command::cargo_bin("beat-exporter").expect("Failed to find beat-exporter binary");
    cmd.env_remove("BEAT_EXPORTER_URL")
        .env_remove("BEAT_EXPORTER_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary config file with given content
fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush");
    file
}

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--once"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test --sample-config prints a config that the binary itself accepts
#[test]
fn test_sample_config() {
    let output = cmd().arg("--sample-config").output().unwrap();
    assert!(output.status.success());

    let sample = String::from_utf8(output.stdout).unwrap();
    assert!(sample.contains("collect_filebeat_stats: true"));
    assert!(sample.contains("http://127.0.0.1:5066"));

    let file = create_temp_config(&sample);
    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

/// Test that a valid configuration is accepted via --validate flag
#[test]
fn test_validate_valid_config() {
    let config = r#"
beat:
  url: "http://filebeat.local:5066"
  collect_system_stats: false
  method: POST
  headers:
    X-Test: test-value
  timeout: 2s
agent:
  interval: 30s
"#;

    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

/// Test that malformed YAML is rejected
#[test]
fn test_validate_invalid_yaml() {
    let file = create_temp_config("beat:\n  url: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that an unparseable Beat URL is rejected
#[test]
fn test_validate_invalid_url() {
    let file = create_temp_config("beat:\n  url: \"not a url\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Beat URL"));
}

/// Test that --validate requires the config file to exist
#[test]
fn test_validate_missing_file() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/beat-exporter.yaml")
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that --once fails when the Beat is unreachable
#[test]
fn test_once_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    cmd()
        .arg("-c")
        .arg("/nonexistent/path/beat-exporter.yaml")
        .arg("--url")
        .arg(format!("http://127.0.0.1:{}", port))
        .arg("--once")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

/// Test that --once prints line protocol for every section
#[tokio::test(flavor = "multi_thread")]
async fn test_once_prints_line_protocol() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "beat": "filebeat",
            "hostname": "node-6",
            "name": "node-6-test",
            "uuid": "9c1c8697-acb4-4df0-987d-28197814f785",
            "version": "6.4.2"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "beat": {"cpu": {"total": {"ticks": 5215010}}},
            "system": {"load": {"1": 32.49}}
        })))
        .mount(&mock_server)
        .await;

    let url = mock_server.uri();
    let output = tokio::task::spawn_blocking(move || {
        cmd()
            .arg("-c")
            .arg("/nonexistent/path/beat-exporter.yaml")
            .arg("--url")
            .arg(url)
            .arg("--once")
            .timeout(std::time::Duration::from_secs(10))
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains(
        "beat,beat_host=node-6,beat_id=9c1c8697-acb4-4df0-987d-28197814f785,\
         beat_name=node-6-test,beat_version=6.4.2 cpu_total_ticks=5215010\n"
    ));
    assert!(stdout.contains("beat_system,"));
    assert!(stdout.contains(" load_1=32.49\n"));
    // Empty sections produce no lines
    assert!(!stdout.contains("beat_filebeat"));
    assert!(!stdout.contains("beat_libbeat"));
}
