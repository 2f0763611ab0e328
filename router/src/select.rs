//! Backlog menu rendering and interactive choice parsing.

use std::fmt::{self, Write as _};

use crate::core::ranking::BacklogView;
use crate::core::schedule::SchedulingState;
use crate::task::{Priority, Task};

const RULE_WIDTH: usize = 70;

/// Why an operator's menu input could not be resolved to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Input was empty or not a non-negative integer.
    NotANumber(String),
    /// The number does not name an option in the menu.
    OutOfRange(usize),
    /// `0` was chosen but the menu offered no continue choice.
    NoContinueChoice,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotANumber(input) => write!(f, "not a task number: {input:?}"),
            SelectionError::OutOfRange(option) => write!(f, "no task with number {option}"),
            SelectionError::NoContinueChoice => f.write_str("there is no last task to continue"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Resolve one line of operator input against the menu.
pub fn parse_choice<'a>(input: &str, view: &BacklogView<'a>) -> Result<&'a Task, SelectionError> {
    let trimmed = input.trim();
    let option: usize = trimmed
        .parse()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;
    if option == 0 {
        return view.continue_task.ok_or(SelectionError::NoContinueChoice);
    }
    view.option(option).ok_or(SelectionError::OutOfRange(option))
}

/// Render the session-start menu, ending with the input prompt (no newline).
pub fn render_backlog(view: &BacklogView<'_>, state: &SchedulingState) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "SESSION START - Task Backlog");
    let _ = writeln!(out, "{rule}\n");

    if let Some(task) = view.continue_task {
        let last_worked = state
            .last_updated
            .get(..16)
            .or(Some(state.last_updated.as_str()))
            .filter(|stamp| !stamp.is_empty())
            .unwrap_or("Unknown");
        let agent = state.last_agent.as_deref().unwrap_or(task.agent.label());
        let _ = writeln!(out, "CONTINUE LAST TASK?\n");
        let _ = writeln!(out, "  [0] Continue: {}", task.name);
        let _ = writeln!(out, "      Status: {}", task.status);
        let _ = writeln!(out, "      Last worked: {last_worked}");
        let _ = writeln!(out, "      Agent: {agent}");
        let _ = writeln!(out, "\n{}\n", "-".repeat(RULE_WIDTH));
    }

    if view.projects.is_empty() {
        let _ = writeln!(out, "No open tasks.\n");
    }
    for group in &view.projects {
        let _ = writeln!(out, "{}\n", group.project.to_uppercase());
        for ranked in &group.tasks {
            let task = ranked.task;
            let _ = writeln!(out, "  [{}] {}{}", ranked.option, task.name, priority_marker(task.priority));
            let _ = writeln!(
                out,
                "      {} | {}min | {}",
                task.agent, task.estimated_minutes, task.status
            );
            if !task.blocked_by.is_empty() {
                let _ = writeln!(out, "      Blocked by: {}", task.blocked_by.join(", "));
            }
            if !task.blocks_tasks.is_empty() {
                let _ = writeln!(out, "      Blocks {} other task(s)", task.blocks_tasks.len());
            }
            out.push('\n');
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{rule}");
    if view.continue_task.is_some() {
        out.push_str("Enter task number (or 0 to continue last task): ");
    } else {
        out.push_str("Enter task number: ");
    }
    out
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => " [CRITICAL]",
        Priority::High => " [HIGH]",
        _ => "",
    }
}
