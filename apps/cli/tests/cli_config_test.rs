//! Integration tests for the `sluice config` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sluice(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sluice").unwrap();
    cmd.current_dir(temp_dir.path()).env_remove("SLUICE_BATCH_SIZE").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_config_defaults() {
    let temp_dir = TempDir::new().unwrap();

    sluice(&temp_dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[pipeline]"))
        .stdout(predicate::str::contains("batch_size = 8"));
}

#[test]
fn test_config_json_from_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(&config_path, "log_level = \"warn\"\n\n[pipeline]\nbatch_size = 16\n").unwrap();

    sluice(&temp_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"batch_size\": 16"))
        .stdout(predicate::str::contains("\"log_level\": \"warn\""));
}

#[test]
fn test_config_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("sluice.toml"), "[pipeline]\nbatch_size = 16\n").unwrap();

    sluice(&temp_dir)
        .env("SLUICE_BATCH_SIZE", "3")
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"batch_size\": 3"));
}

#[test]
fn test_config_invalid_env_value() {
    let temp_dir = TempDir::new().unwrap();

    sluice(&temp_dir)
        .env("SLUICE_BATCH_SIZE", "lots")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration value"));
}

#[test]
fn test_config_missing_explicit_file() {
    let temp_dir = TempDir::new().unwrap();

    sluice(&temp_dir)
        .args(["--config", "nope.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
