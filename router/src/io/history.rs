//! Git-backed heuristics over recent workspace activity.
//!
//! Both heuristics are substring matches against commit messages. They can
//! miss real work (no mention) and can misfire (an unrelated message that
//! happens to contain the id); neither failure mode is corrected here.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::core::schedule::CompletionOracle;
use crate::io::git::Git;
use crate::task::Task;

/// Suggests which task was last worked on when the ledger does not know.
pub trait LastTaskHint {
    fn infer_last_task(&self, tasks: &[Task]) -> Option<String>;
}

static TASK_SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)task:\s*(.+?)\s*-").expect("task subject regex should be valid")
});

/// Completion oracle and last-task hint backed by `git log`.
#[derive(Debug, Clone)]
pub struct GitHistory {
    git: Git,
    window: usize,
}

impl GitHistory {
    /// `window` bounds how many recent commits the last-task hint scans.
    pub fn new(git: Git, window: usize) -> Self {
        Self { git, window }
    }
}

impl CompletionOracle for GitHistory {
    fn most_recent_activity_mentions(&self, subtask_id: &str) -> bool {
        match self.git.last_commit_message() {
            Ok(Some(message)) => {
                let mentioned = message.contains(subtask_id);
                debug!(subtask = subtask_id, mentioned, "checked last commit");
                mentioned
            }
            Ok(None) => false,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "could not read last commit");
                false
            }
        }
    }
}

impl LastTaskHint for GitHistory {
    fn infer_last_task(&self, tasks: &[Task]) -> Option<String> {
        let subjects = match self.git.recent_commit_subjects(self.window) {
            Ok(subjects) => subjects,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "could not read recent commits");
                return None;
            }
        };
        task_from_subjects(&subjects, tasks)
    }
}

/// First task named by a `Task: <name> - ...` subject, newest subject first.
///
/// Names match when either contains the other, ignoring case.
pub fn task_from_subjects<S: AsRef<str>>(subjects: &[S], tasks: &[Task]) -> Option<String> {
    for subject in subjects {
        let lowered = subject.as_ref().to_lowercase();
        let Some(caps) = TASK_SUBJECT_RE.captures(&lowered) else {
            continue;
        };
        let mentioned = caps.get(1).map_or("", |m| m.as_str()).trim();
        if mentioned.is_empty() {
            continue;
        }
        let found = tasks.iter().find(|task| {
            let name = task.name.to_lowercase();
            name.contains(mentioned) || mentioned.contains(&name)
        });
        if let Some(task) = found {
            debug!(task = %task.id, subject = subject.as_ref(), "inferred last task from commit");
            return Some(task.id.clone());
        }
    }
    None
}
