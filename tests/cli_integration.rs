//! Integration tests for the kilnlog CLI
//!
//! These tests exercise the full CLI workflow using a temporary session file.
//! They verify that commands work end-to-end without mocking. Nothing here
//! asks for live weather.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run kilnlog CLI with a specific session path
fn run_kilnlog(args: &[&str], session_path: &PathBuf) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_kilnlog"))
        .args(args)
        .env("KILNLOG_SESSION_PATH", session_path)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute kilnlog")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Run and insist on success
fn ok(args: &[&str], session_path: &PathBuf) -> String {
    let output = run_kilnlog(args, session_path);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        stderr(&output)
    );
    stdout(&output)
}

/// Fresh firing in a temp dir
fn started() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let session_path = temp_dir.path().join("session.json");
    ok(
        &["init", "--kiln", "Ana", "--firing-id", "spring-25", "--user", "mara"],
        &session_path,
    );
    (temp_dir, session_path)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Failed to read file")
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_kilnlog"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("kilnlog"));
    assert!(out.contains("Wood-firing"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_kilnlog"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("kilnlog"));
}

#[test]
fn test_commands_need_a_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let session_path = temp_dir.path().join("session.json");

    let output = run_kilnlog(&["status"], &session_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("kilnlog init"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_kilnlog"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef kilnlog"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_fish() {
    let output = Command::new(env!("CARGO_BIN_EXE_kilnlog"))
        .args(["completion", "fish"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("complete -c kilnlog"));
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_init_and_status() {
    let (_dir, session_path) = started();
    assert!(session_path.exists());

    let out = ok(&["status"], &session_path);
    assert!(out.contains("Ana"));
    assert!(out.contains("spring-25"));
    assert!(out.contains("heating"));
    assert!(out.contains("mara"));
    assert!(out.contains("no readings yet"));
}

#[test]
fn test_phase_can_go_backwards() {
    let (_dir, session_path) = started();
    ok(&["phase", "flash"], &session_path);
    ok(&["phase", "body-reduction"], &session_path);
    assert_eq!(ok(&["phase"], &session_path).trim(), "body_reduction");

    let output = run_kilnlog(&["phase", "molten"], &session_path);
    assert!(!output.status.success());
}

#[test]
fn test_user_switch() {
    let (_dir, session_path) = started();
    ok(&["user", "jo"], &session_path);
    assert_eq!(ok(&["user"], &session_path).trim(), "jo");
    ok(&["user", "--clear"], &session_path);
    assert_eq!(ok(&["user"], &session_path).trim(), "unknown");
}

#[test]
fn test_init_again_keeps_archive() {
    let (_dir, session_path) = started();
    ok(&["log", "add", "1200", "--at", "2025-03-14 07:00"], &session_path);
    ok(&["archive", "save"], &session_path);

    let out = ok(&["init", "--firing-id", "summer-25"], &session_path);
    assert!(out.contains("1 archived"));
    assert!(ok(&["log", "list"], &session_path).contains("No log entries"));
    assert!(ok(&["archive", "list"], &session_path).contains("spring-25"));
}

// =============================================================================
// Event Log Tests
// =============================================================================

#[test]
fn test_log_add_and_list() {
    let (_dir, session_path) = started();

    let out = ok(
        &[
            "log", "add", "1850", "--middle", "1820", "--back", "1790", "-a", "reduction",
            "--damper", "35", "-t", "stoke", "-n", "two splits of oak", "--at",
            "2025-03-14 21:30",
        ],
        &session_path,
    );
    assert!(out.contains("Logged entry 1"));
    ok(&["log", "add", "1700", "--at", "2025-03-14 20:00"], &session_path);

    let out = ok(&["log", "list"], &session_path);
    let first_data_line = out.lines().nth(1).unwrap_or_default();
    assert!(first_data_line.contains("1850"), "newest first: {}", out);
    assert!(out.contains("reduction"));
    assert!(out.contains("two splits of oak"));
    assert!(out.contains("mara"));

    let out = ok(&["log", "list", "--asc"], &session_path);
    assert!(out.lines().nth(1).unwrap_or_default().contains("1700"));

    let out = ok(&["log", "list", "-t", "stoke"], &session_path);
    assert!(!out.contains("1700"));
}

#[test]
fn test_log_rejects_out_of_range_readings() {
    let (_dir, session_path) = started();
    assert!(!run_kilnlog(&["log", "add", "2700"], &session_path).status.success());
    assert!(!run_kilnlog(&["log", "add", "40"], &session_path).status.success());
    assert!(!run_kilnlog(&["log", "add", "900", "--damper", "120"], &session_path)
        .status
        .success());
    assert!(ok(&["log", "list"], &session_path).contains("No log entries"));
}

#[test]
fn test_log_edit_and_delete() {
    let (_dir, session_path) = started();
    ok(&["log", "add", "900", "--at", "2025-03-14 09:00"], &session_path);
    ok(&["user", "jo"], &session_path);

    let out = ok(&["log", "edit", "1", "--front", "950", "-n", "fixed typo"], &session_path);
    assert!(out.contains("Updated entry 1"));
    let out = ok(&["log", "list"], &session_path);
    assert!(out.contains("950"));
    assert!(out.contains("fixed typo"));

    let out = ok(&["log", "edit", "42", "-n", "nobody home"], &session_path);
    assert!(out.contains("no log entry 42"));

    ok(&["log", "delete", "1"], &session_path);
    assert!(ok(&["log", "delete", "1"], &session_path).contains("no log entry 1"));
    assert!(ok(&["log", "list"], &session_path).contains("No log entries"));
}

// =============================================================================
// Wood, Crew, Cones, Timer, Checklist
// =============================================================================

#[test]
fn test_wood_running_total() {
    let (_dir, session_path) = started();
    ok(&["wood", "add", "6", "-s", "oak", "--at", "2025-03-14 10:00"], &session_path);
    ok(&["wood", "add", "4", "-s", "pine", "--at", "2025-03-14 09:00"], &session_path);

    let out = ok(&["wood", "list"], &session_path);
    assert!(out.contains("10 pieces, 2 species"));
    assert!(!run_kilnlog(&["wood", "add", "51"], &session_path).status.success());
}

#[test]
fn test_wood_stock() {
    let (dir, session_path) = started();
    ok(&["wood", "stock", "add", "pine", "-c", "1.5", "-m", "18"], &session_path);
    ok(&["wood", "stock", "add", "red oak", "-c", "0.5", "-m", "35", "-l", "shed B"], &session_path);

    let out = ok(&["wood", "stock", "list"], &session_path);
    assert!(out.contains("red oak"));
    assert!(out.contains("shed B"));
    assert!(out.contains("2.00 cords, 1.50 seasoned, 2 species"));

    assert!(!run_kilnlog(&["wood", "stock", "add", "ash", "-m", "101"], &session_path)
        .status
        .success());

    let csv_path = dir.path().join("stock.csv");
    ok(
        &["export", "inventory", "-o", csv_path.to_str().unwrap()],
        &session_path,
    );
    let csv = read(&csv_path);
    assert!(csv.starts_with("species,cords,moisture_pct,location"));
    assert!(csv.contains("red oak,0.5,35,shed B"));

    ok(&["wood", "stock", "delete", "1"], &session_path);
    assert!(!ok(&["wood", "stock", "list"], &session_path).contains("pine"));
}

#[test]
fn test_crew_roster() {
    let (_dir, session_path) = started();
    ok(&["crew", "add", "Jo", "stoker", "--start", "06:00", "--end", "12:00"], &session_path);
    ok(&["crew", "add", "Sam", "spotter", "--start", "22:00"], &session_path);

    let out = ok(&["crew", "list"], &session_path);
    assert!(out.contains("Jo"));
    assert!(out.contains("06:00-12:00"));
    assert!(out.contains("spotter"));

    ok(&["crew", "remove", "1"], &session_path);
    assert!(!ok(&["crew", "list"], &session_path).contains("Jo"));
    assert!(!run_kilnlog(&["crew", "add", "Kit", "pyromaniac"], &session_path)
        .status
        .success());
}

#[test]
fn test_cone_map() {
    let (_dir, session_path) = started();
    ok(&["cone", "set", "R3C4", "06", "bending"], &session_path);
    ok(&["cone", "set", "r3c4", "04", "standing"], &session_path);

    let out = ok(&["cone", "show"], &session_path);
    assert!(out.contains("2 cones at 1 positions"));
    assert!(out.contains("R3C4"));

    ok(&["cone", "clear", "R3C4"], &session_path);
    assert!(ok(&["cone", "show"], &session_path).contains("0 cones at 0 positions"));

    let output = run_kilnlog(&["cone", "set", "R7C1", "9", "down"], &session_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("R7C1"));
}

#[test]
fn test_timer_start_and_stop() {
    let (_dir, session_path) = started();
    assert!(ok(&["timer", "show"], &session_path).contains("idle"));

    let out = ok(&["timer", "start", "-m", "12"], &session_path);
    assert!(out.contains("12 min"));
    let out = ok(&["timer", "show"], &session_path);
    assert!(out.contains("every 12 min"));
    assert!(!out.contains("idle"));

    ok(&["timer", "stop"], &session_path);
    assert!(ok(&["timer", "show"], &session_path).contains("idle"));
    assert!(!run_kilnlog(&["timer", "start", "-m", "61"], &session_path)
        .status
        .success());
}

#[test]
fn test_checklist() {
    let (_dir, session_path) = started();
    for item in 1..=8 {
        ok(&["checklist", "check", &item.to_string()], &session_path);
    }
    let out = ok(&["checklist", "show"], &session_path);
    assert!(out.contains("All safety checks complete"));

    ok(&["checklist", "uncheck", "3"], &session_path);
    assert!(!ok(&["checklist", "show"], &session_path).contains("All safety checks complete"));
    assert!(ok(&["checklist", "check", "9"], &session_path).contains("no checklist item 9"));
}

// =============================================================================
// Export and Archive Tests
// =============================================================================

#[test]
fn test_export_empty_log_is_header_only() {
    let (_dir, session_path) = started();
    let out = ok(&["export", "firing-log"], &session_path);
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("kiln,firing_id,time,logged_by,phase,entry_type,temp_front"));
}

#[test]
fn test_export_all_writes_every_file() {
    let (dir, session_path) = started();
    ok(&["log", "add", "1200", "--at", "2025-03-14 07:00"], &session_path);
    let out_dir = dir.path().join("out");
    ok(
        &["export", "all", "-o", out_dir.to_str().unwrap()],
        &session_path,
    );

    for name in [
        "firing_log.csv",
        "wood.csv",
        "wood_inventory.csv",
        "crew.csv",
        "kiln_map.csv",
        "summary.csv",
    ] {
        assert!(out_dir.join(name).exists(), "{} missing", name);
    }
    let summary = read(&out_dir.join("summary.csv"));
    assert!(summary.starts_with("firing_id,kiln,final_phase"));
    assert!(summary.contains("spring-25,Ana,heating"));
}

#[test]
fn test_export_import_compare() {
    let (dir, session_path) = started();
    for (temp, at) in [
        ("300", "2025-03-14 06:00"),
        ("1790", "2025-03-14 14:00"),
        ("1850", "2025-03-14 16:00"),
        ("2300", "2025-03-15 02:00"),
    ] {
        ok(&["log", "add", temp, "--at", at], &session_path);
    }
    let csv_path = dir.path().join("spring.csv");
    ok(
        &["export", "firing-log", "-o", csv_path.to_str().unwrap()],
        &session_path,
    );

    // Next firing, compare against the exported one
    ok(&["init", "--firing-id", "summer-25"], &session_path);
    let out = ok(&["archive", "import", csv_path.to_str().unwrap()], &session_path);
    assert!(out.contains("spring-25"));
    assert!(out.contains("4 rows"));

    let list = ok(&["archive", "list"], &session_path);
    assert!(list.contains("2300"));
    assert!(list.contains("20.00"));

    ok(&["log", "add", "1800", "--at", "2025-06-01 12:00"], &session_path);
    let out = ok(&["archive", "compare", "spring-25"], &session_path);
    assert!(out.contains("1790"));
    assert!(!out.contains("1850F"));

    let output = run_kilnlog(&["archive", "compare", "winter-99"], &session_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("winter-99"));
}

#[test]
fn test_malformed_import_leaves_archive_empty() {
    let (dir, session_path) = started();
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "time,temp_front\n2025-03-14 06:00:00,300\n2025-03-14 07:00:00,400,oops\n")
        .unwrap();

    let output = run_kilnlog(&["archive", "import", bad.to_str().unwrap()], &session_path);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bad"));
    assert!(ok(&["archive", "list"], &session_path).contains("No archived firings"));
}
