//! Integration tests for the evergreen CLI
//!
//! These tests exercise the full CLI workflow using a temporary database.
//! They verify that commands work end-to-end without mocking.

use chrono::{Duration, Local};
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run evergreen CLI with a specific database path
fn run_evergreen(args: &[&str], db_path: &PathBuf) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_evergreen"))
        .args(args)
        .env("EVERGREEN_DB_PATH", db_path)
        .output()
        .expect("Failed to execute evergreen")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Today formatted the way --date expects
fn day(offset: i64) -> String {
    (Local::now().date_naive() - Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_evergreen"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("evergreen"));
    assert!(out.contains("habits"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_evergreen"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("evergreen"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_evergreen"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    let out = stdout(&output);
    assert!(
        out.contains("#compdef evergreen"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_evergreen"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion bash failed: {}",
        stderr(&output)
    );
    let out = stdout(&output);
    assert!(
        out.contains("_evergreen"),
        "bash completion should contain _evergreen function"
    );
}

// =============================================================================
// Habit CRUD Tests
// =============================================================================

#[test]
fn test_add_and_list_habits() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let output = run_evergreen(&["habit", "add", "read"], &db_path);
    assert!(
        output.status.success(),
        "habit add failed: {}",
        stderr(&output)
    );
    assert!(stdout(&output).contains("Created habit"));

    let output = run_evergreen(
        &[
            "habit", "add", "morning-routine", "-p", "min-count", "-r", "5", "-t", "8",
        ],
        &db_path,
    );
    assert!(
        output.status.success(),
        "habit add with predicate failed: {}",
        stderr(&output)
    );

    let output = run_evergreen(&["habit", "list"], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("read"));
    assert!(out.contains("morning-routine"));
    assert!(out.contains("5 of 8"));
}

#[test]
fn test_duplicate_habit_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);
    let output = run_evergreen(&["habit", "add", "read"], &db_path);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_archive_hides_habit() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "old"], &db_path);
    let output = run_evergreen(&["habit", "archive", "1"], &db_path);
    assert!(output.status.success(), "archive failed: {}", stderr(&output));

    let out = stdout(&run_evergreen(&["habit", "list"], &db_path));
    assert!(!out.contains("old"));

    let out = stdout(&run_evergreen(&["habit", "list", "--all"], &db_path));
    assert!(out.contains("old"));
    assert!(out.contains("archived"));
}

// =============================================================================
// Logging and Streak Tests
// =============================================================================

#[test]
fn test_log_and_streak() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);

    let output = run_evergreen(&["log", "read"], &db_path);
    assert!(output.status.success(), "log failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Logged"));

    // Second log the same day updates in place
    let output = run_evergreen(&["log", "read", "-n", "chapter 4"], &db_path);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Updated"));

    let output = run_evergreen(&["streak", "read"], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("current streak: 1"));
    assert!(out.contains("longest streak: 1"));
}

#[test]
fn test_backfill_builds_streak_and_fires_milestone() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);

    run_evergreen(&["log", "read", "--date", &day(2)], &db_path);
    run_evergreen(&["log", "read", "--date", &day(1)], &db_path);
    let output = run_evergreen(&["log", "read", "--date", &day(0)], &db_path);

    assert!(output.status.success(), "log failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("streak 3"), "expected streak 3 in: {}", out);
    assert!(out.contains("3-day streak"), "milestone should fire: {}", out);

    // Logging again above the threshold does not re-fire
    let output = run_evergreen(&["log", "read", "--date", &day(0), "-c", "2"], &db_path);
    assert!(!stdout(&output).contains("3-day streak"));
}

#[test]
fn test_unlog_removes_entry() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);
    run_evergreen(&["log", "read"], &db_path);

    let output = run_evergreen(&["unlog", "read"], &db_path);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Removed entry"));

    let output = run_evergreen(&["streak", "read"], &db_path);
    assert!(stdout(&output).contains("current streak: 0"));
}

#[test]
fn test_log_future_date_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);
    let output = run_evergreen(&["log", "read", "--date", &day(-1)], &db_path);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("future"));
}

#[test]
fn test_log_unknown_habit_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let output = run_evergreen(&["log", "nope"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));
}

// =============================================================================
// Capture Tests
// =============================================================================

#[test]
fn test_capture_and_classify() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let output = run_evergreen(&["capture", "add", "call the dentist"], &db_path);
    assert!(output.status.success(), "capture failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Captured"));

    run_evergreen(&["capture", "add", "long day, good run"], &db_path);

    let out = stdout(&run_evergreen(&["capture", "list", "--pending"], &db_path));
    assert!(out.contains("call the dentist"));
    assert!(out.contains("pending"));

    let output = run_evergreen(&["capture", "classify"], &db_path);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("task"), "dentist call should be a task: {}", out);
    assert!(out.contains("journal"), "run note should be journal: {}", out);

    // Nothing left to classify
    let out = stdout(&run_evergreen(&["capture", "list", "--pending"], &db_path));
    assert!(out.contains("Inbox zero"));
}

#[test]
fn test_duplicate_capture_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["capture", "add", "call mom"], &db_path);
    let output = run_evergreen(&["capture", "add", "call mom"], &db_path);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Already captured"));
}

// =============================================================================
// Contact Tests
// =============================================================================

#[test]
fn test_contact_workflow() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let output = run_evergreen(
        &["contact", "add", "Ada", "--circle", "friends", "--cadence", "5"],
        &db_path,
    );
    assert!(output.status.success(), "contact add failed: {}", stderr(&output));

    // Never contacted -> due
    let out = stdout(&run_evergreen(&["contact", "due"], &db_path));
    assert!(out.contains("Ada"));
    assert!(out.contains("never contacted"));

    // Fresh interaction clears it
    let output = run_evergreen(
        &["contact", "log", "Ada", "--channel", "call"],
        &db_path,
    );
    assert!(output.status.success());

    let out = stdout(&run_evergreen(&["contact", "due"], &db_path));
    assert!(out.contains("All caught up"));

    // An old interaction puts them past cadence again
    run_evergreen(
        &["contact", "add", "Grace", "--cadence", "5"],
        &db_path,
    );
    run_evergreen(
        &["contact", "log", "Grace", "--date", &day(12)],
        &db_path,
    );
    let out = stdout(&run_evergreen(&["contact", "due"], &db_path));
    assert!(out.contains("Grace"));
    assert!(out.contains("7 days past cadence"));
}

// =============================================================================
// Goal Tests
// =============================================================================

#[test]
fn test_goal_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let output = run_evergreen(&["goal", "add", "Run 1000 miles", "-y", "2025"], &db_path);
    assert!(output.status.success(), "goal add failed: {}", stderr(&output));

    let out = stdout(&run_evergreen(&["goal", "list"], &db_path));
    assert!(out.contains("Run 1000 miles"));
    assert!(out.contains("2025"));
    assert!(out.contains("active"));

    let output = run_evergreen(&["goal", "status", "1", "completed"], &db_path);
    assert!(output.status.success());

    let out = stdout(&run_evergreen(&["goal", "list"], &db_path));
    assert!(out.contains("completed"));

    let output = run_evergreen(&["goal", "status", "1", "paused"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid goal status"));
}

#[test]
fn test_habit_attached_to_goal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["goal", "add", "1000 miles", "-y", "2025"], &db_path);
    let output = run_evergreen(&["habit", "add", "run", "-g", "1"], &db_path);
    assert!(output.status.success(), "habit with goal failed: {}", stderr(&output));

    // Unknown goal is rejected
    let output = run_evergreen(&["habit", "add", "swim", "-g", "99"], &db_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Goal 99 not found"));
}

// =============================================================================
// Dashboard and Report Tests
// =============================================================================

#[test]
fn test_dashboard_shows_everything() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);
    run_evergreen(&["log", "read"], &db_path);
    run_evergreen(&["contact", "add", "Ada"], &db_path);
    run_evergreen(&["capture", "add", "an unsorted thought"], &db_path);

    let output = run_evergreen(&["dashboard"], &db_path);
    assert!(output.status.success(), "dashboard failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Habits"));
    assert!(out.contains("read"));
    assert!(out.contains("People"));
    assert!(out.contains("Ada"));
    assert!(out.contains("Inbox"));
    assert!(out.contains("1 pending"));
}

#[test]
fn test_report_markdown() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    run_evergreen(&["habit", "add", "read"], &db_path);
    run_evergreen(&["log", "read"], &db_path);

    let output = run_evergreen(&["report"], &db_path);
    assert!(output.status.success(), "report failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("# Evergreen Review"));
    assert!(out.contains("## Habits"));
    assert!(out.contains("**read**"));

    // Report to a file
    let report_path = temp_dir.path().join("review.md");
    let output = run_evergreen(
        &["report", "-o", report_path.to_str().unwrap()],
        &db_path,
    );
    assert!(output.status.success());
    let contents = std::fs::read_to_string(&report_path).expect("report file should exist");
    assert!(contents.contains("# Evergreen Review"));
}
