//! Prompt assembly: renders the instruction document for one subtask.
//!
//! Rendering is pure. It reads the task, its decomposed chain and the
//! ledger's last proposal, and never looks at or changes completion state.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::schedule::SchedulingState;
use crate::task::{Agent, Subtask, Task};

const ASSIGNMENT_TEMPLATE: &str = include_str!("prompts/assignment.md");

/// Instruction bodies keyed by `(is review stage, agent)`; see [`instruction_template`].
const INSTRUCTION_TEMPLATES: &[(&str, &str)] = &[
    ("review_codex", include_str!("prompts/instructions/review_codex.md")),
    ("review_chatgpt", include_str!("prompts/instructions/review_chatgpt.md")),
    ("review_claude_code", include_str!("prompts/instructions/review_claude_code.md")),
    ("codex", include_str!("prompts/instructions/codex.md")),
    ("claude_code", include_str!("prompts/instructions/claude_code.md")),
    ("chatgpt", include_str!("prompts/instructions/chatgpt.md")),
    ("generic", include_str!("prompts/instructions/generic.md")),
];

/// Subtask fields exposed to templates.
#[derive(Debug, Clone, Serialize)]
struct SubtaskContext {
    id: String,
    description: String,
    agent: &'static str,
    minutes: i64,
    parallel_ok: bool,
}

impl SubtaskContext {
    fn from_subtask(subtask: &Subtask) -> Self {
        Self {
            id: subtask.id.clone(),
            description: subtask.description.clone(),
            agent: subtask.agent.label(),
            minutes: subtask.estimated_minutes,
            parallel_ok: subtask.parallel_ok,
        }
    }
}

/// Task fields exposed to templates.
#[derive(Debug, Clone, Serialize)]
struct TaskContext {
    name: String,
    project: String,
    priority: &'static str,
}

impl TaskContext {
    fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            project: task.project.clone(),
            priority: task.priority.name(),
        }
    }
}

/// Previously proposed subtask of the same task, for orientation.
#[derive(Debug, Clone, Serialize)]
struct PreviousContext {
    id: String,
    agent: String,
}

/// Template engine wrapper around minijinja.
pub struct PromptAssembler {
    env: Environment<'static>,
}

impl PromptAssembler {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("assignment", ASSIGNMENT_TEMPLATE)
            .context("assignment template")?;
        for &(name, source) in INSTRUCTION_TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("instruction template {name}"))?;
        }
        Ok(Self { env })
    }

    /// Render the full prompt for `subtask` of `task`.
    ///
    /// The hand-off target is the subtask after `subtask` in `chain`.
    pub fn render(
        &self,
        task: &Task,
        chain: &[Subtask],
        subtask: &Subtask,
        state: &SchedulingState,
    ) -> Result<String> {
        let next = next_in_chain(chain, subtask);
        let task_ctx = TaskContext::from_task(task);
        let subtask_ctx = SubtaskContext::from_subtask(subtask);

        let instructions = self
            .env
            .get_template(instruction_template(subtask))?
            .render(context! { task => &task_ctx, subtask => &subtask_ctx })
            .context("render instructions")?;

        let rendered = self
            .env
            .get_template("assignment")?
            .render(context! {
                task => &task_ctx,
                subtask => &subtask_ctx,
                previous => previous_proposal(task, subtask, state),
                context_files => context_files(task),
                instructions => instructions.trim(),
                checklist => checklist(subtask),
                completion_status => completion_status(next),
                next => next.map(SubtaskContext::from_subtask),
            })
            .context("render assignment")?;
        Ok(rendered)
    }
}

/// The subtask after `subtask` in `chain`, if any.
pub fn next_in_chain<'a>(chain: &'a [Subtask], subtask: &Subtask) -> Option<&'a Subtask> {
    let index = chain.iter().position(|s| s.id == subtask.id)?;
    chain.get(index + 1)
}

/// Two-axis dispatch: review/verification stage × assigned agent.
fn instruction_template(subtask: &Subtask) -> &'static str {
    match (subtask.stage.is_review(), subtask.agent) {
        (true, Agent::Codex) => "review_codex",
        (true, Agent::ChatGpt) => "review_chatgpt",
        (true, Agent::ClaudeCode) => "review_claude_code",
        (false, Agent::Codex) => "codex",
        (false, Agent::ClaudeCode) => "claude_code",
        (false, Agent::ChatGpt) => "chatgpt",
        _ => "generic",
    }
}

/// Success checklist, varied along the same axes as the instructions.
fn checklist(subtask: &Subtask) -> Vec<String> {
    let server_role = subtask.agent == Agent::ClaudeCode;
    let docs_role = subtask.agent == Agent::Codex;
    let mut items: Vec<String> = Vec::new();

    if subtask.stage.is_review() {
        items.extend(
            [
                "Reviewed previous agent's work (checked git log)",
                "Verified against project conventions",
                "Checked for logic errors or edge cases",
                "Tested functionality (if applicable)",
            ]
            .map(String::from),
        );
        if server_role {
            items.push("Tested on server (if applicable)".to_string());
            items.push("No errors in logs".to_string());
        }
        items.extend(
            [
                "Documented review findings",
                "Either: Approved and ready for next step",
                "Or: Issues documented with clear fixes needed",
                "Changes committed to git",
            ]
            .map(String::from),
        );
    } else {
        items.push(format!("Task completed: {}", subtask.description));
        items.extend(
            [
                "Code follows project conventions",
                "Changes committed to git",
                "TASKS.md updated with progress",
            ]
            .map(String::from),
        );
        if server_role {
            items.push("Tested on server (if applicable)".to_string());
            items.push("No errors in logs".to_string());
        }
        if docs_role {
            items.push("Documentation is clear and complete".to_string());
            items.push("YAML is valid (if applicable)".to_string());
        }
    }
    items
}

fn context_files(task: &Task) -> Vec<String> {
    if !task.context_files.is_empty() {
        return task.context_files.clone();
    }
    vec![
        format!("{}/LOCAL_CONTEXT.md (2 min overview)", task.project),
        format!("{}/TASKS.md (check your assignment)", task.project),
        ".github/AGENTS.md (understand your role)".to_string(),
    ]
}

fn completion_status(next: Option<&Subtask>) -> String {
    match next {
        Some(next) => format!("In Progress - Next: {}", next.agent),
        None => "Complete - Ready for next task".to_string(),
    }
}

fn previous_proposal(task: &Task, subtask: &Subtask, state: &SchedulingState) -> Option<PreviousContext> {
    if state.last_task_id.as_deref() != Some(task.id.as_str()) {
        return None;
    }
    let id = state.last_subtask_id.as_deref().filter(|id| *id != subtask.id)?;
    Some(PreviousContext {
        id: id.to_string(),
        agent: state.last_agent.clone().unwrap_or_default(),
    })
}
