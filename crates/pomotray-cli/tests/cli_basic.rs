//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomotray"))
        .args(args)
        .env("POMOTRAY_DATA_DIR", data_dir)
        .env_remove("POMOTRAY_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run `pomotray run` feeding `input` on stdin.
fn run_timer(data_dir: &Path, args: &[&str], input: &str) -> (String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomotray"))
        .arg("run")
        .args(args)
        .env("POMOTRAY_DATA_DIR", data_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn timer");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0, "Config list failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["durations"]["work"], 25);
    assert_eq!(parsed["sessions"]["long_break_interval"], 4);
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_get() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "durations.short_break"]);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_config_set_clamps_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "durations.work", "90"]);
    assert_eq!(code, 0, "Config set failed");
    assert_eq!(stdout.trim(), "durations.work = 60");

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "durations.work"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_set_rejects_non_numeric_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "durations.work", "abc"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "durations.work"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "ui.dark_mode"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_auto_start_policy() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.auto_start", "always"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.auto_start"]);
    assert_eq!(stdout.trim(), "always");
}

#[test]
fn test_stats_all_on_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0, "Stats all failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["total_sessions"], 0);
    assert_eq!(parsed["work_sessions"], 0);
}

#[test]
fn test_stats_list_rejects_unknown_period() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["stats", "list", "--period", "decade"]);
    assert_ne!(code, 0);
}

#[test]
fn test_run_shows_countdown_and_quits() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, code) = run_timer(dir.path(), &[], "start\nquit\n");
    assert_eq!(code, 0, "Timer run failed");
    assert!(stdout.contains("25:00"));
}

#[test]
fn test_run_uses_configured_break_duration() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "durations.short_break", "7"]);
    let (stdout, code) = run_timer(dir.path(), &["--mode", "short-break"], "q\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("07:00"));
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomotray"));
}
