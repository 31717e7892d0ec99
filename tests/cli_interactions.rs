//! CLI options interaction tests
//!
//! These tests run the `lsamp` binary and check exit codes, console output
//! and the files a run leaves behind.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const CONFIG_ENV_VARS: &[&str] = &[
    "TARGET_URL",
    "TEST_DURATION",
    "MIN_INTERVAL",
    "MAX_INTERVAL",
    "TIMEOUT_SECONDS",
    "OUTPUT_DIR",
    "ENABLE_COLOR",
];

/// Command running in `dir` with no configuration inherited from the environment
fn create_test_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lsamp").unwrap();
    cmd.current_dir(dir);
    for key in CONFIG_ENV_VARS {
        cmd.env_remove(key);
    }
    cmd
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--report-from"))
        .stdout(predicate::str::contains("--min-interval"))
        .stdout(predicate::str::contains("--preset"));
}

#[test]
fn test_inverted_interval_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--min-interval", "9", "--max-interval", "3", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_timeout_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timeout must be greater than 0"));
}

#[test]
fn test_unknown_preset_rejected() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--preset", "reckless"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_env_timeout_is_config_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .env("TIMEOUT_SECONDS", "900")
        .args(["--duration", "0", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TIMEOUT_SECONDS"));
}

#[test]
fn test_env_file_in_working_directory_is_loaded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "TARGET_URL=ftp://example.com/\n").unwrap();

    create_test_cmd(dir.path())
        .args(["--duration", "0", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TARGET_URL"));
}

#[test]
fn test_zero_duration_run_has_no_report() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    create_test_cmd(dir.path())
        .arg("--duration")
        .arg("0")
        .arg("--output-dir")
        .arg(&out)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results to generate report"))
        .stdout(predicate::str::contains("Accepted 0/0 iterations"));

    assert_eq!(files_with_prefix(&out, "human_readable_results_").len(), 1);
    assert_eq!(files_with_prefix(&out, "raw_results_").len(), 1);
    assert!(files_with_prefix(&out, "graphed_results_").is_empty());
}

#[test]
fn test_report_from_valid_dump() {
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("raw_results_20240101000000.txt");
    let mut text = String::from("# latency-sampler raw v1\n");
    for i in 1..=75 {
        text.push_str(&format!("{}\t{}\t5.25\t8\n", i, 10.0 + i as f64 / 4.0));
    }
    fs::write(&dump, text).unwrap();

    create_test_cmd(dir.path())
        .arg("--report-from")
        .arg(&dump)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written"));

    for prefix in [
        "http_response_time_graph_",
        "tcp_response_time_graph_",
        "dns_response_time_graph_",
        "graphed_results_",
        "summary_",
    ] {
        assert_eq!(files_with_prefix(dir.path(), prefix).len(), 1, "{}", prefix);
    }
}

#[test]
fn test_report_from_malformed_dump_fails() {
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("raw.txt");
    fs::write(&dump, "# latency-sampler raw v1\n1\t7\t5\t8\n[(2, 7.0, 5.0, 8.0)]\n").unwrap();

    create_test_cmd(dir.path())
        .arg("--report-from")
        .arg(&dump)
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 3"));

    assert!(files_with_prefix(dir.path(), "graphed_results_").is_empty());
}

#[test]
fn test_report_from_missing_dump_is_io_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--report-from", "does_not_exist.txt", "--no-color"])
        .assert()
        .code(5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_short_run_against_local_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>hello</html>", "text/html"))
        .mount(&server)
        .await;

    let port = server.address().port();
    let url = format!("{}/index.html", server.uri());
    let dir = TempDir::new().unwrap();

    create_test_cmd(dir.path())
        .args(["--url", &url, "--tcp-port", &port.to_string()])
        .args(["--duration", "1", "--min-interval", "1", "--max-interval", "1", "--timeout", "5"])
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Iteration: 1"))
        .stdout(predicate::str::contains("RSP_CODE: 200"))
        .stdout(predicate::str::contains("Accepted 1/1 iterations"));

    let logs = files_with_prefix(dir.path(), "human_readable_results_");
    assert_eq!(logs.len(), 1);
    let log = fs::read_to_string(dir.path().join(&logs[0])).unwrap();
    assert!(log.starts_with(&format!("REQ_URL: {}, RSP_CODE: 200, REQ_START: ", url)));
    assert_eq!(files_with_prefix(dir.path(), "graphed_results_").len(), 1);
}
