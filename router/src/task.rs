//! Backlog data model: tasks, their decomposed subtasks, and the labels they carry.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::decompose::DecompositionEngine;

/// Lifecycle status declared for a task in its backlog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Blocked,
    ReadyForReview,
    ReadyForDeployment,
    Complete,
}

impl TaskStatus {
    /// Match order used when scanning free-form status text.
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::ReadyForReview,
        TaskStatus::ReadyForDeployment,
        TaskStatus::Complete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::ReadyForReview => "Ready for Review",
            TaskStatus::ReadyForDeployment => "Ready for Deployment",
            TaskStatus::Complete => "Complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task priority. The discriminant is the ranking ordinal (lower ranks first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
    Deferred = 5,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::Deferred => "DEFERRED",
        }
    }

    /// Parse a priority word case-insensitively (`high`, `Critical`, ...).
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Priority::Critical),
            "HIGH" => Some(Priority::High),
            "MEDIUM" => Some(Priority::Medium),
            "LOW" => Some(Priority::Low),
            "DEFERRED" => Some(Priority::Deferred),
            _ => None,
        }
    }
}

/// The fixed set of agents a subtask can be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Agent {
    ClaudeCode,
    Codex,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Perplexity,
    Gemini,
    LogMonitor,
    Router,
}

impl Agent {
    /// Match order used when scanning free-form agent text.
    pub const ALL: [Agent; 7] = [
        Agent::ClaudeCode,
        Agent::Codex,
        Agent::ChatGpt,
        Agent::Perplexity,
        Agent::Gemini,
        Agent::LogMonitor,
        Agent::Router,
    ];

    /// Agent assumed when a backlog entry names none.
    pub const DEFAULT: Agent = Agent::Codex;

    pub fn label(self) -> &'static str {
        match self {
            Agent::ClaudeCode => "Claude Code",
            Agent::Codex => "Codex",
            Agent::ChatGpt => "ChatGPT",
            Agent::Perplexity => "Perplexity",
            Agent::Gemini => "Gemini",
            Agent::LogMonitor => "Log Monitor",
            Agent::Router => "Router (Decision Engine)",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role-scoped step kind. The suffix is appended to the task id to form the subtask id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Plan,
    Implement,
    Review,
    Test,
    Research,
    Document,
    Draft,
    Validate,
    Fix,
    Verify,
    Complete,
}

impl Stage {
    pub fn suffix(self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Implement => "implement",
            Stage::Review => "review",
            Stage::Test => "test",
            Stage::Research => "research",
            Stage::Document => "document",
            Stage::Draft => "yaml",
            Stage::Validate => "validate",
            Stage::Fix => "fix",
            Stage::Verify => "verify",
            Stage::Complete => "complete",
        }
    }

    /// Review and verification stages check someone else's work.
    pub fn is_review(self) -> bool {
        matches!(self, Stage::Review | Stage::Verify)
    }
}

/// A single role-scoped step produced by decomposing a [`Task`].
///
/// Completion is not stored here; it is membership of `id` in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub stage: Stage,
    pub description: String,
    pub agent: Agent,
    /// May be zero or negative for degenerate estimates (see `DESIGN.md`).
    pub estimated_minutes: i64,
    /// Ids of subtasks in the same chain that must be complete first.
    pub dependencies: Vec<String>,
    /// Advisory only; never consulted by scheduling.
    pub parallel_ok: bool,
}

impl Subtask {
    pub fn new(task: &Task, stage: Stage, description: String, agent: Agent, minutes: i64) -> Self {
        Self {
            id: subtask_id(&task.id, stage),
            stage,
            description,
            agent,
            estimated_minutes: minutes,
            dependencies: Vec::new(),
            parallel_ok: false,
        }
    }

    pub fn after(mut self, dependency: &Subtask) -> Self {
        self.dependencies.push(dependency.id.clone());
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel_ok = true;
        self
    }

    pub fn has_degenerate_estimate(&self) -> bool {
        self.estimated_minutes <= 0
    }
}

/// `{task_id}_{suffix}`.
pub fn subtask_id(task_id: &str, stage: Stage) -> String {
    format!("{}_{}", task_id, stage.suffix())
}

/// A top-level unit of backlog work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub project: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub estimated_minutes: u32,
    pub agent: Agent,
    pub description: String,
    pub context_files: Vec<String>,
    pub blocks_tasks: Vec<String>,
    pub blocked_by: Vec<String>,
    subtasks: OnceCell<Vec<Subtask>>,
}

impl Task {
    /// Create a task with backlog defaults for every metadata field.
    pub fn new(id: impl Into<String>, name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project: project.into(),
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            estimated_minutes: 30,
            agent: Agent::DEFAULT,
            description: String::new(),
            context_files: Vec::new(),
            blocks_tasks: Vec::new(),
            blocked_by: Vec::new(),
            subtasks: OnceCell::new(),
        }
    }

    /// The subtask chain, decomposed on first access and fixed afterwards.
    pub fn subtasks(&self, engine: &DecompositionEngine) -> &[Subtask] {
        self.subtasks.get_or_init(|| engine.decompose(self))
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::RoleAssignments;

    #[test]
    fn subtask_id_joins_task_id_and_suffix() {
        assert_eq!(subtask_id("proj_fix_it", Stage::Verify), "proj_fix_it_verify");
        assert_eq!(subtask_id("ha_lights", Stage::Draft), "ha_lights_yaml");
    }

    #[test]
    fn decomposition_is_memoized_per_task_value() {
        let engine = DecompositionEngine::new(RoleAssignments::default());
        let task = Task::new("p_implement_x", "Implement x", "p");

        let first = task.subtasks(&engine).as_ptr();
        let second = task.subtasks(&engine).as_ptr();
        assert_eq!(first, second);
        assert_eq!(task.subtasks(&engine).len(), 4);

        let other = DecompositionEngine::new(RoleAssignments {
            planner: Agent::Gemini,
            ..RoleAssignments::default()
        });
        assert_eq!(task.subtasks(&other)[0].agent, Agent::ChatGpt);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!(Priority::from_word("critical"), Some(Priority::Critical));
        assert_eq!(Priority::from_word("Low"), Some(Priority::Low));
        assert_eq!(Priority::from_word("urgent"), None);
        assert!(Priority::Critical < Priority::Deferred);
    }

    #[test]
    fn agent_serializes_as_kebab_id() {
        let json = serde_json::to_string(&Agent::ChatGpt).expect("serialize");
        assert_eq!(json, "\"chatgpt\"");
        let parsed: Agent = serde_json::from_str("\"claude-code\"").expect("parse");
        assert_eq!(parsed, Agent::ClaudeCode);
    }
}
