//! CLI tests for `session-router`.
//!
//! Spawns the binary and verifies exit codes and stdout for missing
//! workspaces, missing previous tasks, and a normal `--next` run.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use session_router::core::schedule::SchedulingState;
use session_router::exit_codes;
use session_router::test_support::TestWorkspace;

fn router(dir: &std::path::Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_session-router"))
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn session-router");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

#[test]
fn missing_github_dir_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = router(temp.path(), &["--next"], "");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a valid workspace"), "{stderr}");
}

#[test]
fn next_without_previous_task_is_invalid() {
    let ws = TestWorkspace::new();
    let output = router(ws.root(), &["--next"], "");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No previous task found"));
}

#[test]
fn last_without_previous_task_is_invalid() {
    let ws = TestWorkspace::new();
    let output = router(ws.root(), &["--last"], "");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn last_with_vanished_task_is_invalid() {
    let ws = TestWorkspace::new();
    ws.write_ledger(&SchedulingState {
        last_task_id: Some("web_gone".to_string()),
        ..SchedulingState::default()
    });
    let output = router(ws.root(), &["--last"], "");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Could not find task: web_gone"));
}

#[test]
fn workspace_flag_overrides_cwd() {
    let ws = TestWorkspace::new();
    ws.write_tasks("web", "### Fix footer links\n**Estimated Time:** 20 minutes\n");
    ws.write_ledger(&SchedulingState {
        last_task_id: Some("web_fix_footer_links".to_string()),
        ..SchedulingState::default()
    });

    let elsewhere = tempfile::tempdir().expect("tempdir");
    let root = ws.root().to_string_lossy().into_owned();
    let output = router(elsewhere.path(), &["--next", "-C", &root], "");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NEXT TASK PROMPT"));
    assert!(stdout.contains("# AGENT ASSIGNMENT: Codex"));
    assert_eq!(
        ws.ledger().last_subtask_id.as_deref(),
        Some("web_fix_footer_links_fix")
    );
}

#[test]
fn interactive_invalid_choice_exits_ok_without_ledger() {
    let ws = TestWorkspace::new();
    ws.write_tasks("web", "### Fix footer links\n");
    let output = router(ws.root(), &[], "7\n");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SESSION START - Task Backlog"));
    assert!(stdout.contains("Invalid choice"));
    assert!(!ws.ledger_path().exists());
}

#[test]
fn interactive_choice_prints_prompt() {
    let ws = TestWorkspace::new();
    ws.write_tasks("web", "### Fix footer links\n");
    let output = router(ws.root(), &[], "1\n");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TASK PROMPT (Copy & Paste into Agent)"));
    assert!(stdout.contains("**Subtask:** `web_fix_footer_links_fix`"));
}
