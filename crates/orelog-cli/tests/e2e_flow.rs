//! End-to-end integration tests for the orelog binary.
//!
//! Drives the compiled CLI against a temp log directory: pilot
//! discovery, history aggregation, and profile editing round trips.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn orelog_binary() -> String {
    env!("CARGO_BIN_EXE_orelog").to_string()
}

fn run_orelog(home: &Path, log_dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(orelog_binary())
        .env("HOME", home)
        .env("ORELOG_LOG_DIR", log_dir)
        .args(args)
        .output()
        .expect("failed to run orelog")
}

fn write_pilot_log(dir: &Path, name: &str, listener: &str, mined_units: &str) {
    let contents = format!(
        "\u{feff}  Listener: {listener}\n  Session started: 2026.08.12\n\
         [ 2026.08.12 18:03:21 ] (mining) You mined <font size=12><color=#ff00ff66>{mined_units}<color=#ff00a99d><font size=10> units of <color=#ffd98d00><font size=12>Veldspar\n"
    );
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn pilots_lists_discovered_logs() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    write_pilot_log(&logs, "Chat_Log_90000001_20260812.txt", "Sami Orised", "100");

    let output = run_orelog(temp.path(), &logs, &["pilots"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("90000001"), "stdout: {stdout}");
    assert!(stdout.contains("Sami Orised"), "stdout: {stdout}");
}

#[test]
fn pilots_json_is_parseable() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    write_pilot_log(&logs, "Chat_Log_90000001_20260812.txt", "Sami Orised", "100");

    let output = run_orelog(temp.path(), &logs, &["pilots", "--json"]);
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["id"], "90000001");
    assert_eq!(rows[0]["name"], "Sami Orised");
    assert_eq!(rows[0]["visible"], true);
}

#[test]
fn history_aggregates_recent_logs() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    write_pilot_log(
        &logs,
        "Chat_Log_90000001_20260812.txt",
        "Sami Orised",
        "1,000",
    );

    let output = run_orelog(temp.path(), &logs, &["history", "--days", "7"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // 1,000 units of Veldspar at 0.1 m3 each.
    assert!(stdout.contains("100.0 m3"), "stdout: {stdout}");
    assert!(stdout.contains("Veldspar"), "stdout: {stdout}");

    let output = run_orelog(temp.path(), &logs, &["history", "--days", "7", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["per_ore"]["90000001"]["Veldspar"], 100.0);
}

#[test]
fn history_of_empty_directory_reports_no_data() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();

    let output = run_orelog(temp.path(), &logs, &["history"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No mining data"), "stdout: {stdout}");
}

#[test]
fn profile_edits_round_trip() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();

    let output = run_orelog(
        temp.path(),
        &logs,
        &["profile", "create", "90000001", "Hulk"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_orelog(
        temp.path(),
        &logs,
        &["profile", "switch", "90000001", "Hulk"],
    );
    assert!(output.status.success());

    let output = run_orelog(
        temp.path(),
        &logs,
        &[
            "profile",
            "set-module",
            "90000001",
            "0",
            "--name",
            "Strip Miner I",
            "--yield-m3",
            "540",
            "--cycle",
            "180",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_orelog(temp.path(), &logs, &["profile", "list", "90000001"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("* Hulk"), "stdout: {stdout}");
    assert!(stdout.contains("Strip Miner I"), "stdout: {stdout}");
    // 540 m3 / 180 s = 3 m3/s = 10,800 m3/hr.
    assert!(stdout.contains("10,800.0 m3/hr"), "stdout: {stdout}");
}

#[test]
fn deleting_the_last_profile_fails() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    fs::create_dir(&logs).unwrap();

    let output = run_orelog(
        temp.path(),
        &logs,
        &["profile", "delete", "90000001", "Default"],
    );
    assert!(!output.status.success());
}
