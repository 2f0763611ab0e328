//! Progress ledger and next-subtask selection.
//!
//! Completion is tracked purely by subtask id membership in
//! `completed_subtasks`. The ledger also remembers what was last *proposed*
//! so the next invocation can ask the completion oracle about it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::{Subtask, Task};

/// Answers whether recent activity suggests a subtask was finished.
///
/// Implementations are heuristics and must not fail: uncertainty and errors
/// are reported as `false`.
pub trait CompletionOracle {
    fn most_recent_activity_mentions(&self, subtask_id: &str) -> bool;
}

/// Persisted scheduling ledger (`.github/session_state.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingState {
    /// Task most recently handed out.
    pub last_task_id: Option<String>,
    /// Subtask most recently handed out (not necessarily finished).
    pub last_subtask_id: Option<String>,
    /// Label of the agent the last subtask was assigned to.
    pub last_agent: Option<String>,
    /// Timestamp of the last save.
    pub last_updated: String,
    /// Append-only; treated as a set.
    pub completed_subtasks: Vec<String>,
}

/// Where a task stands against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskProgress<'a> {
    /// The subtask to hand out next.
    Ready(&'a Subtask),
    /// Some subtasks remain but none has its dependencies met.
    Blocked,
    /// Every subtask in the chain is complete.
    Complete,
}

impl SchedulingState {
    pub fn is_complete(&self, subtask_id: &str) -> bool {
        self.completed_subtasks.iter().any(|id| id == subtask_id)
    }

    /// Record a subtask as complete. Returns `false` if it already was.
    pub fn mark_complete(&mut self, subtask_id: &str) -> bool {
        if self.is_complete(subtask_id) {
            debug!(subtask = subtask_id, "subtask already complete");
            return false;
        }
        debug!(subtask = subtask_id, "marking subtask complete");
        self.completed_subtasks.push(subtask_id.to_string());
        true
    }

    /// First subtask in chain order that is incomplete and whose
    /// dependencies are all complete.
    pub fn next_actionable<'a>(&self, subtasks: &'a [Subtask]) -> Option<&'a Subtask> {
        subtasks.iter().find(|subtask| {
            !self.is_complete(&subtask.id)
                && subtask.dependencies.iter().all(|dep| self.is_complete(dep))
        })
    }

    /// Classify a chain as ready, blocked or complete.
    pub fn progress<'a>(&self, subtasks: &'a [Subtask]) -> TaskProgress<'a> {
        if let Some(subtask) = self.next_actionable(subtasks) {
            return TaskProgress::Ready(subtask);
        }
        if subtasks.iter().all(|subtask| self.is_complete(&subtask.id)) {
            TaskProgress::Complete
        } else {
            TaskProgress::Blocked
        }
    }

    /// Ask `oracle` about the last proposed subtask and mark it complete on
    /// affirmation. Returns the subtask id that was newly marked.
    pub fn infer_completion_from_history<O: CompletionOracle + ?Sized>(
        &mut self,
        oracle: &O,
    ) -> Option<String> {
        let subtask_id = self.last_subtask_id.clone()?;
        if !oracle.most_recent_activity_mentions(&subtask_id) {
            debug!(subtask = %subtask_id, "no completion evidence for last subtask");
            return None;
        }
        self.mark_complete(&subtask_id).then_some(subtask_id)
    }

    /// Remember the subtask about to be handed out.
    pub fn record_proposal(&mut self, task: &Task, subtask: &Subtask) {
        debug!(task = %task.id, subtask = %subtask.id, agent = %subtask.agent, "recording proposal");
        self.last_task_id = Some(task.id.clone());
        self.last_subtask_id = Some(subtask.id.clone());
        self.last_agent = Some(subtask.agent.label().to_string());
    }

    pub fn touch(&mut self, timestamp: impl Into<String>) {
        self.last_updated = timestamp.into();
    }
}
