//! Deterministic decomposition of a task into an ordered subtask chain.
//!
//! Patterns are evaluated in a fixed order and the first whose predicate
//! matches builds the chain. A task no pattern claims becomes a single
//! `complete` subtask.

use tracing::{debug, warn};

use crate::core::roles::RoleAssignments;
use crate::task::{Stage, Subtask, Task};

/// Project whose tasks follow the draft → review → validate → test flow.
pub const HOME_ASSISTANT_PROJECT: &str = "home-assistant-config";

/// Minutes reserved for planning, review and testing around an implementation.
const IMPLEMENT_OVERHEAD_MINUTES: i64 = 30;
const FIXED_STAGE_MINUTES: i64 = 10;

/// One decomposition rule: a predicate on the task and the chain it yields.
struct Pattern {
    name: &'static str,
    matches: fn(&Task) -> bool,
    build: fn(&Task, &RoleAssignments) -> Vec<Subtask>,
}

const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "implementation",
        matches: is_implementation,
        build: implementation_chain,
    },
    Pattern {
        name: "documentation",
        matches: is_documentation,
        build: documentation_chain,
    },
    Pattern {
        name: "home-assistant",
        matches: is_home_assistant,
        build: home_assistant_chain,
    },
    Pattern {
        name: "fix",
        matches: is_fix,
        build: fix_chain,
    },
];

/// Maps tasks to subtask chains using the configured role assignments.
#[derive(Debug, Clone, Default)]
pub struct DecompositionEngine {
    roles: RoleAssignments,
}

impl DecompositionEngine {
    pub fn new(roles: RoleAssignments) -> Self {
        Self { roles }
    }

    /// Build the subtask chain for `task`.
    ///
    /// Prefer [`Task::subtasks`], which memoizes the result on the task value.
    pub fn decompose(&self, task: &Task) -> Vec<Subtask> {
        let (pattern, chain) = match PATTERNS.iter().find(|p| (p.matches)(task)) {
            Some(pattern) => (pattern.name, (pattern.build)(task, &self.roles)),
            None => ("single", single_chain(task)),
        };
        debug!(task = %task.id, pattern, subtasks = chain.len(), "decomposed task");
        for subtask in chain.iter().filter(|s| s.has_degenerate_estimate()) {
            warn!(
                subtask = %subtask.id,
                minutes = subtask.estimated_minutes,
                "subtask estimate is not positive"
            );
        }
        chain
    }
}

fn is_implementation(task: &Task) -> bool {
    name_contains_any(task, &["implement", "create"])
}

fn is_documentation(task: &Task) -> bool {
    name_contains_any(task, &["document", "research"])
}

fn is_home_assistant(task: &Task) -> bool {
    task.project == HOME_ASSISTANT_PROJECT
}

fn is_fix(task: &Task) -> bool {
    name_contains_any(task, &["fix", "cleanup", "refactor"])
}

fn name_contains_any(task: &Task, needles: &[&str]) -> bool {
    let name = task.name.to_lowercase();
    needles.iter().any(|needle| name.contains(needle))
}

/// Integer share of the task estimate, truncated toward zero.
fn share(task: &Task, percent: u32) -> i64 {
    i64::from(task.estimated_minutes) * i64::from(percent) / 100
}

fn implementation_chain(task: &Task, roles: &RoleAssignments) -> Vec<Subtask> {
    let plan = Subtask::new(
        task,
        Stage::Plan,
        format!("Plan implementation for: {}", task.name),
        roles.planner,
        FIXED_STAGE_MINUTES,
    );
    let implement = Subtask::new(
        task,
        Stage::Implement,
        format!("Implement: {}", task.name),
        task.agent,
        i64::from(task.estimated_minutes) - IMPLEMENT_OVERHEAD_MINUTES,
    )
    .after(&plan);
    let review = Subtask::new(
        task,
        Stage::Review,
        format!("Review implementation: {}", task.name),
        roles.code_reviewer,
        FIXED_STAGE_MINUTES,
    )
    .after(&implement);
    let test = Subtask::new(
        task,
        Stage::Test,
        format!("Test and validate: {}", task.name),
        roles.validator,
        FIXED_STAGE_MINUTES,
    )
    .after(&review);
    vec![plan, implement, review, test]
}

fn documentation_chain(task: &Task, roles: &RoleAssignments) -> Vec<Subtask> {
    let third = i64::from(task.estimated_minutes / 3);
    let research = Subtask::new(
        task,
        Stage::Research,
        format!("Research: {}", task.name),
        roles.researcher,
        third,
    )
    .parallel();
    let document = Subtask::new(
        task,
        Stage::Document,
        format!("Document findings: {}", task.name),
        roles.documenter,
        third,
    )
    .after(&research);
    let review = Subtask::new(
        task,
        Stage::Review,
        format!("Review documentation: {}", task.name),
        roles.design_reviewer,
        third,
    )
    .after(&document);
    vec![research, document, review]
}

fn home_assistant_chain(task: &Task, roles: &RoleAssignments) -> Vec<Subtask> {
    let draft = Subtask::new(
        task,
        Stage::Draft,
        format!("Draft YAML for: {}", task.name),
        roles.documenter,
        share(task, 40),
    );
    let review = Subtask::new(
        task,
        Stage::Review,
        format!("Review YAML structure and conventions: {}", task.name),
        roles.design_reviewer,
        share(task, 20),
    )
    .after(&draft);
    let validate = Subtask::new(
        task,
        Stage::Validate,
        format!("Validate syntax and deploy: {}", task.name),
        roles.validator,
        share(task, 20),
    )
    .after(&review);
    let test = Subtask::new(
        task,
        Stage::Test,
        format!("Test automation on server: {}", task.name),
        roles.validator,
        share(task, 20),
    )
    .after(&validate);
    vec![draft, review, validate, test]
}

fn fix_chain(task: &Task, roles: &RoleAssignments) -> Vec<Subtask> {
    let fix = Subtask::new(
        task,
        Stage::Fix,
        format!("Fix/cleanup: {}", task.name),
        task.agent,
        share(task, 70),
    );
    let verify = Subtask::new(
        task,
        Stage::Verify,
        format!("Verify fix: {}", task.name),
        roles.validator,
        share(task, 30),
    )
    .after(&fix);
    vec![fix, verify]
}

fn single_chain(task: &Task) -> Vec<Subtask> {
    vec![Subtask::new(
        task,
        Stage::Complete,
        task.name.clone(),
        task.agent,
        i64::from(task.estimated_minutes),
    )]
}
