//! Corruption recovery tests for the luna binary.
//!
//! These tests verify the system can handle:
//! - Corrupted settings files (read paths fall back to defaults)
//! - Corrupted period log lines
//! - Corrupted daily log files (writes fail loudly)
//! - Out-of-domain stored settings

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn luna(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luna"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn user_dir(data_dir: &Path) -> std::path::PathBuf {
    let dir = data_dir.join("users/default");
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_corrupted_settings_file() {
    let temp_dir = setup_test_dir();
    let dir = user_dir(temp_dir.path());

    fs::write(dir.join("settings.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted settings");

    luna(temp_dir.path())
        .args(["--today", "2024-06-20", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycle day 15 of 28"));
}

#[test]
fn test_corrupted_period_lines_ignored() {
    let temp_dir = setup_test_dir();

    luna(temp_dir.path())
        .args(["period", "--start", "2024-01-01"])
        .assert()
        .success();

    let periods_path = user_dir(temp_dir.path()).join("periods.jsonl");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&periods_path)
        .unwrap();
    writeln!(file, "{{\"id\": \"partial").unwrap();

    luna(temp_dir.path())
        .args(["period", "--start", "2024-01-29"])
        .assert()
        .success();

    luna(temp_dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-29"))
        .stdout(predicate::str::contains("2024-01-01"));
}

#[test]
fn test_corrupted_daily_log_fails_write_but_calendar_renders() {
    let temp_dir = setup_test_dir();
    let dir = user_dir(temp_dir.path());

    fs::write(dir.join("daily.json"), "[{ broken").unwrap();

    luna(temp_dir.path())
        .args(["log", "2024-02-03", "--flow", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unreadable"));

    // The broken file is left for manual recovery, not overwritten
    let content = fs::read_to_string(dir.join("daily.json")).unwrap();
    assert_eq!(content, "[{ broken");

    luna(temp_dir.path())
        .args(["--today", "2024-02-10", "calendar", "--month", "2024-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("February 2024"));
}

#[test]
fn test_out_of_domain_settings_clamped_on_read() {
    let temp_dir = setup_test_dir();
    let dir = user_dir(temp_dir.path());

    let settings = serde_json::json!({
        "user_id": "default",
        "average_cycle_length": 90,
        "average_period_length": 5,
        "last_period_start": "2024-01-01",
        "notifications_enabled": true
    });
    fs::write(dir.join("settings.json"), settings.to_string()).unwrap();

    luna(temp_dir.path())
        .args(["--today", "2024-01-01", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycle day 1 of 60"));
}

#[test]
fn test_missing_files() {
    let temp_dir = setup_test_dir();

    luna(temp_dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No periods logged yet"));
}
