//! CLI options interaction tests
//!
//! These tests run the binary in an empty working directory so that no
//! stray `.env` file or inherited variable changes the outcome. Only
//! offline paths (`--help`, `--help-env`, `--dry-run`, configuration
//! failures) are exercised.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const CONFIG_VARS: &[&str] = &[
    "MQTT_SERVER",
    "MQTT_SERVER_PORT",
    "MQTT_USERNAME",
    "MQTT_PASSWORD",
    "MQTT_TOPIC",
    "PRIMARY_PAYLOAD",
    "PING_COUNT",
    "PING_HOST",
    "PING_MAX_ATTEMPTS",
    "PERCENTILE",
    "DOWNLOAD_ITERATIONS",
    "UPLOAD_ITERATIONS",
    "SPEEDTEST_URL",
    "PACING_SECONDS",
    "TIMEOUT_SECONDS",
    "ENABLE_COLOR",
];

/// Helper function to create a test command inside `dir` with a clean configuration environment
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("speedtest-publisher").unwrap();
    cmd.current_dir(dir.path());
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Helper function to create a temporary directory holding a `.env` file
fn create_temp_config(content: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".env"), content).unwrap();
    temp_dir
}

#[test]
fn test_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--help-env"))
        .stdout(predicate::str::contains("--no-color"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_env_lists_variables() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT_SERVER_PORT"))
        .stdout(predicate::str::contains("DOWNLOAD_ITERATIONS"))
        .stdout(predicate::str::contains("PING_MAX_ATTEMPTS"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_dry_run_with_defaults() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT Broker: localhost:1883"))
        .stdout(predicate::str::contains("MQTT Topics: speedtest, speedtest/attributes"))
        .stdout(predicate::str::contains("Download Plan: 10,8,6,4,2"))
        .stdout(predicate::str::contains("Upload Plan: 8,6,4,2"))
        .stdout(predicate::str::contains("Percentile: 90"))
        .stdout(predicate::str::contains("dry run"));
}

#[test]
fn test_dry_run_reads_env_file() {
    let dir = create_temp_config("MQTT_SERVER=broker.lan\nMQTT_TOPIC=home/speed\nPING_COUNT=5\n");
    create_test_cmd(&dir)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT Broker: broker.lan:1883"))
        .stdout(predicate::str::contains("home/speed/attributes"))
        .stdout(predicate::str::contains("Ping: 5 samples"));
}

#[test]
fn test_environment_overrides_env_file() {
    let dir = create_temp_config("MQTT_SERVER=from-file\n");
    create_test_cmd(&dir)
        .env("MQTT_SERVER", "from-env")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT Broker: from-env:1883"));
}

#[test]
fn test_cli_timeout_overrides_environment() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("TIMEOUT_SECONDS", "90")
        .args(["--dry-run", "--timeout", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timeout: 15s"));
}

#[test]
fn test_credentials_need_both_values() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("MQTT_USERNAME", "user")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT Auth: disabled"));

    create_test_cmd(&dir)
        .env("MQTT_USERNAME", "user")
        .env("MQTT_PASSWORD", "secret")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("MQTT Auth: enabled"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn test_overlong_plan_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("DOWNLOAD_ITERATIONS", "1,1,1,1,1,1,1,1,1,1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("DOWNLOAD_ITERATIONS"));
}

#[test]
fn test_unusable_percentile_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("PERCENTILE", "100")
        .arg("--dry-run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("PERCENTILE"));
}

#[test]
fn test_invalid_env_file_value() {
    let dir = create_temp_config("PING_COUNT=many\n");
    create_test_cmd(&dir)
        .arg("--dry-run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("PING_COUNT"));
}

#[test]
fn test_verbose_error_includes_suggestion() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("PRIMARY_PAYLOAD", "xml")
        .args(["--dry-run", "--verbose"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--help-env"));
}

#[test]
fn test_invalid_timeout_rejected() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duration must be greater than 0"));
}

#[test]
fn test_color_flags_conflict() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--color", "--no-color", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn test_enable_color_applies_to_error_report() {
    let dir = TempDir::new().unwrap();
    // Offline failure after configuration: the probe is refused on the first attempt
    let run = |enable_color: &str| {
        create_test_cmd(&dir)
            .env_remove("NO_COLOR")
            .env("TERM", "xterm")
            .env("CLICOLOR_FORCE", "1")
            .env("ENABLE_COLOR", enable_color)
            .env("PING_HOST", "127.0.0.1")
            .env("PING_MAX_ATTEMPTS", "1")
            .assert()
            .failure()
            .code(3)
    };

    run("true").stderr(predicate::str::contains("\x1b["));
    run("false")
        .stderr(predicate::str::contains("[PROBE]"))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_debug_prints_command_line_summary() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--debug", "--dry-run", "--timeout", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Debug mode enabled"))
        .stdout(predicate::str::contains("Timeout override: 20s"));
}
