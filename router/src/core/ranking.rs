//! Deterministic ordering of the open backlog for selection.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::core::schedule::SchedulingState;
use crate::task::Task;

/// One numbered menu option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedTask<'a> {
    /// 1-based option number, unique across all projects.
    pub option: usize,
    pub task: &'a Task,
}

/// Open tasks of a single project in ranked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup<'a> {
    pub project: &'a str,
    pub tasks: Vec<RankedTask<'a>>,
}

/// Ranked backlog plus the optional "continue last task" choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogView<'a> {
    pub continue_task: Option<&'a Task>,
    pub projects: Vec<ProjectGroup<'a>>,
}

impl<'a> BacklogView<'a> {
    /// Resolve a numbered option (not the continue choice).
    pub fn option(&self, option: usize) -> Option<&'a Task> {
        self.ranked().find(|r| r.option == option).map(|r| r.task)
    }

    /// All ranked options in display order.
    pub fn ranked(&self) -> impl Iterator<Item = RankedTask<'a>> + '_ {
        self.projects.iter().flat_map(|group| group.tasks.iter().copied())
    }
}

/// Sort key within a project: in-progress first, then priority ordinal, then
/// tasks blocking more others, then shorter estimates.
fn rank_key(task: &Task) -> (bool, u8, Reverse<usize>, u32) {
    (
        !task.is_in_progress(),
        task.priority.ordinal(),
        Reverse(task.blocks_tasks.len()),
        task.estimated_minutes,
    )
}

/// Stable in-place ranking of one project's tasks.
pub fn rank_tasks(tasks: &mut [&Task]) {
    tasks.sort_by_key(|task| rank_key(task));
}

/// Group open tasks by project (alphabetical) and rank within each group.
///
/// Ties keep backlog source order. The continue choice is the ledger's last
/// task when it still resolves to an open task.
pub fn rank_backlog<'a>(tasks: &'a [Task], state: &SchedulingState) -> BacklogView<'a> {
    let mut by_project: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in tasks.iter().filter(|task| !task.is_complete()) {
        by_project.entry(task.project.as_str()).or_default().push(task);
    }

    let mut option = 1;
    let mut projects = Vec::with_capacity(by_project.len());
    for (project, mut project_tasks) in by_project {
        rank_tasks(&mut project_tasks);
        let ranked = project_tasks
            .into_iter()
            .map(|task| {
                let entry = RankedTask { option, task };
                option += 1;
                entry
            })
            .collect();
        projects.push(ProjectGroup {
            project,
            tasks: ranked,
        });
    }

    let continue_task = state
        .last_task_id
        .as_deref()
        .and_then(|id| tasks.iter().find(|task| task.id == id))
        .filter(|task| !task.is_complete());

    BacklogView {
        continue_task,
        projects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};
    use crate::test_support::{task, task_in_project};

    fn names<'a>(view: &BacklogView<'a>) -> Vec<&'a str> {
        view.ranked().map(|r| r.task.name.as_str()).collect()
    }

    #[test]
    fn critical_task_outranks_shorter_high_task() {
        let mut critical = task("a", "Critical work", 90);
        critical.priority = Priority::Critical;
        critical.blocks_tasks = vec!["x".to_string(), "y".to_string()];
        let mut high = task("b", "High work", 15);
        high.priority = Priority::High;

        let tasks = vec![high, critical];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        assert_eq!(names(&view), vec!["Critical work", "High work"]);
    }

    #[test]
    fn in_progress_sorts_before_priority() {
        let mut critical = task("a", "Critical", 10);
        critical.priority = Priority::Critical;
        let mut low = task("b", "Low but started", 10);
        low.priority = Priority::Low;
        low.status = TaskStatus::InProgress;

        let tasks = vec![critical, low];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        assert_eq!(names(&view), vec!["Low but started", "Critical"]);
    }

    #[test]
    fn more_blocking_then_shorter_breaks_priority_ties() {
        let mut blocker = task("a", "Blocker", 60);
        blocker.blocks_tasks = vec!["x".to_string()];
        let short = task("b", "Short", 5);
        let long = task("c", "Long", 50);

        let tasks = vec![long, short, blocker];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        assert_eq!(names(&view), vec!["Blocker", "Short", "Long"]);
    }

    #[test]
    fn ties_preserve_source_order() {
        let tasks = vec![task("a", "First", 30), task("b", "Second", 30), task("c", "Third", 30)];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        assert_eq!(names(&view), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn projects_are_alphabetical_and_options_are_contiguous() {
        let tasks = vec![
            task_in_project("z1", "Zeta task", "zeta", 30),
            task_in_project("a1", "Alpha task", "alpha", 30),
            task_in_project("a2", "Alpha other", "alpha", 40),
        ];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        let projects: Vec<&str> = view.projects.iter().map(|g| g.project).collect();
        assert_eq!(projects, vec!["alpha", "zeta"]);
        let options: Vec<usize> = view.ranked().map(|r| r.option).collect();
        assert_eq!(options, vec![1, 2, 3]);
        assert_eq!(view.option(3).map(|t| t.id.as_str()), Some("z1"));
        assert!(view.option(4).is_none());
    }

    #[test]
    fn complete_tasks_are_hidden() {
        let mut done = task("a", "Done", 30);
        done.status = TaskStatus::Complete;
        let tasks = vec![done, task("b", "Open", 30)];
        let view = rank_backlog(&tasks, &SchedulingState::default());
        assert_eq!(names(&view), vec!["Open"]);
    }

    #[test]
    fn continue_choice_requires_open_last_task() {
        let mut done = task("a", "Done", 30);
        done.status = TaskStatus::Complete;
        let tasks = vec![done, task("b", "Open", 30)];

        let mut state = SchedulingState {
            last_task_id: Some("b".to_string()),
            ..SchedulingState::default()
        };
        let view = rank_backlog(&tasks, &state);
        assert_eq!(view.continue_task.map(|t| t.id.as_str()), Some("b"));

        state.last_task_id = Some("a".to_string());
        assert!(rank_backlog(&tasks, &state).continue_task.is_none());

        state.last_task_id = Some("gone".to_string());
        assert!(rank_backlog(&tasks, &state).continue_task.is_none());
    }
}
