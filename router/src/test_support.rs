//! Test-only helpers: task builders, scripted collaborators, and temporary
//! workspaces.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

use crate::core::schedule::{CompletionOracle, SchedulingState};
use crate::io::backlog::BacklogSource;
use crate::io::history::LastTaskHint;
use crate::io::ledger::{load_ledger, write_ledger};
use crate::io::workspace::GITHUB_DIR;
use crate::task::Task;

/// Task in project `proj` with backlog defaults and an explicit estimate.
pub fn task(id: &str, name: &str, minutes: u32) -> Task {
    task_in_project(id, name, "proj", minutes)
}

/// Task in an explicit project with backlog defaults.
pub fn task_in_project(id: &str, name: &str, project: &str, minutes: u32) -> Task {
    let mut task = Task::new(id, name, project);
    task.estimated_minutes = minutes;
    task
}

/// Ledger whose only content is the given completed subtask ids.
pub fn ledger_with(completed: &[&str]) -> SchedulingState {
    SchedulingState {
        completed_subtasks: completed.iter().map(|id| id.to_string()).collect(),
        ..SchedulingState::default()
    }
}

/// History collaborator with canned answers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHistory {
    mentioned: Vec<String>,
    last_task: Option<String>,
}

impl ScriptedHistory {
    /// Affirms completion for exactly these subtask ids.
    pub fn mentioning(ids: &[&str]) -> Self {
        Self {
            mentioned: ids.iter().map(|id| id.to_string()).collect(),
            last_task: None,
        }
    }

    /// Never affirms completion and never suggests a last task.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_last_task(mut self, task_id: &str) -> Self {
        self.last_task = Some(task_id.to_string());
        self
    }
}

impl CompletionOracle for ScriptedHistory {
    fn most_recent_activity_mentions(&self, subtask_id: &str) -> bool {
        self.mentioned.iter().any(|id| id == subtask_id)
    }
}

impl LastTaskHint for ScriptedHistory {
    fn infer_last_task(&self, tasks: &[Task]) -> Option<String> {
        let id = self.last_task.as_deref()?;
        tasks.iter().any(|task| task.id == id).then(|| id.to_string())
    }
}

/// In-memory backlog in source order.
#[derive(Debug, Clone, Default)]
pub struct StaticBacklog(pub Vec<Task>);

impl BacklogSource for StaticBacklog {
    fn tasks(&self) -> Vec<Task> {
        self.0.clone()
    }
}

/// Temporary workspace root with a `.github/` directory.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join(GITHUB_DIR)).expect("create .github");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the default ledger location.
    pub fn ledger_path(&self) -> std::path::PathBuf {
        self.root().join(GITHUB_DIR).join("session_state.json")
    }

    pub fn write_ledger(&self, state: &SchedulingState) {
        write_ledger(&self.ledger_path(), state).expect("write ledger");
    }

    pub fn ledger(&self) -> SchedulingState {
        load_ledger(&self.ledger_path())
    }

    /// Write `<project>/TASKS.md`.
    pub fn write_tasks(&self, project: &str, contents: &str) {
        let dir = self.root().join(project);
        fs::create_dir_all(&dir).expect("create project dir");
        fs::write(dir.join("TASKS.md"), contents).expect("write TASKS.md");
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// `git init` with a local identity so commits work on bare CI machines.
pub fn init_git_repo(path: &Path) -> Result<()> {
    git(path, &["init", "--quiet"])?;
    git(path, &["config", "user.name", "Session Router Tests"])?;
    git(path, &["config", "user.email", "tests@example.invalid"])?;
    git(path, &["config", "commit.gpgsign", "false"])
}

/// Stage everything and commit with `message`.
pub fn commit_all(path: &Path, message: &str) -> Result<()> {
    git(path, &["add", "-A"])?;
    git(path, &["commit", "--quiet", "--allow-empty", "-m", message])
}

fn git(path: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
