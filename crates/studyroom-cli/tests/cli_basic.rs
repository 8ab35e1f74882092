//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studyroom"))
        .args(args)
        .env("STUDYROOM_DATA_DIR", data_dir)
        .env_remove("STUDYROOM_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_timer_status_defaults() {
    let dir = TempDir::new().unwrap();
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["display"], "25:00");
    assert_eq!(status["label"], "Focus Time");
    assert_eq!(status["running"], false);
}

#[test]
fn test_timer_start_persists_running_state() {
    let dir = TempDir::new().unwrap();
    let started = json(&run_ok(dir.path(), &["timer", "start"]));
    assert_eq!(started["type"], "TimerStarted");

    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["running"], true);
    assert_eq!(status["phase"], "focus");
}

#[test]
fn test_timer_focus_minutes_are_clamped_and_saved() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "focus", "120"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "90"
    );

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "focus", "abc"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid minutes"));
}

#[test]
fn test_attendance_toggle_and_show() {
    let dir = TempDir::new().unwrap();
    let toggled = json(&run_ok(
        dir.path(),
        &["attendance", "toggle", "Physics", "--date", "2024-09-02"],
    ));
    assert_eq!(toggled["status"], "present");
    run_ok(
        dir.path(),
        &["attendance", "toggle", "Physics", "--date", "2024-09-03"],
    );
    run_ok(
        dir.path(),
        &["attendance", "toggle", "Physics", "--date", "2024-09-03"],
    );

    let shown = json(&run_ok(dir.path(), &["attendance", "show", "Physics"]));
    assert_eq!(shown["summary"]["total"], 2);
    assert_eq!(shown["summary"]["percentage"], 50);
    assert_eq!(shown["bar"]["values"], serde_json::json!([1, 1]));
}

#[test]
fn test_event_lifecycle() {
    let dir = TempDir::new().unwrap();
    let created = run_ok(
        dir.path(),
        &[
            "event",
            "add",
            "Lab report",
            "--subject",
            "Chemistry",
            "--start",
            "2030-01-10T09:00:00Z",
            "--end",
            "2030-01-10T10:00:00Z",
        ],
    );
    let id = created
        .trim()
        .strip_prefix("Event created: ")
        .expect("created line")
        .to_string();

    let listed = run_ok(dir.path(), &["event", "list"]);
    assert!(listed.contains("Lab report"));
    assert!(listed.contains("Level: Beginner"));

    let reminders = json(&run_ok(dir.path(), &["event", "reminders"]));
    assert_eq!(reminders["reminders"].as_array().unwrap().len(), 1);

    assert!(run_ok(dir.path(), &["event", "done", &id]).contains("Event completed"));
    assert!(run_ok(dir.path(), &["event", "done", &id]).contains("already completed"));
    assert!(run_ok(dir.path(), &["event", "completed"]).contains(&id));

    run_ok(dir.path(), &["event", "delete", &id]);
    assert!(run_ok(dir.path(), &["event", "list"]).contains("No events."));
}

#[test]
fn test_event_rejects_inverted_range() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &[
            "event",
            "add",
            "Backwards",
            "--subject",
            "Math",
            "--start",
            "2030-01-10T10:00:00Z",
            "--end",
            "2030-01-10T09:00:00Z",
        ],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_gpa_edit_and_reject_out_of_range_marks() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["gpa", "set", "1", "1", "name", "Math"]);
    run_ok(dir.path(), &["gpa", "set", "1", "1", "marks", "95"]);
    let report = json(&run_ok(dir.path(), &["gpa", "set", "1", "1", "credits", "4"]));
    assert_eq!(report["cgpa"], "10.00");

    let (_, _, code) = run_cli(dir.path(), &["gpa", "set", "1", "1", "marks", "140"]);
    assert_ne!(code, 0);

    let report = json(&run_ok(dir.path(), &["gpa", "show"]));
    assert_eq!(report["semesters"][0]["subjects"][0]["marks"], "95");
}

#[test]
fn test_subjects_and_prefs() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["subject", "add", "Biology"]);
    assert!(run_ok(dir.path(), &["subject", "list"]).contains("Biology"));

    run_ok(dir.path(), &["prefs", "theme", "dark"]);
    assert_eq!(run_ok(dir.path(), &["prefs", "theme"]).trim(), "dark");

    run_ok(dir.path(), &["prefs", "todo", "add", "Revise notes"]);
    let list = run_ok(dir.path(), &["prefs", "todo", "done", "1"]);
    assert!(list.contains("1. [x] Revise notes"));
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}
