//! Backlog source: parses each project's `TASKS.md` into [`Task`] records.
//!
//! Parsing never rejects a task. Missing or malformed metadata falls back to
//! defaults (NotStarted, Medium, Codex, 30 minutes).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::task::{Agent, Priority, Task, TaskStatus};

const ID_NAME_CHARS: usize = 30;
const DESCRIPTION_CHARS: usize = 200;
const DEFAULT_MINUTES: u32 = 30;

/// Supplies the tasks of the current workspace.
///
/// Implementations fail soft: unreadable sources yield fewer (or no) tasks.
pub trait BacklogSource {
    fn tasks(&self) -> Vec<Task>;
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("backlog regex should be valid")
}

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^###\s+"));
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)\*\*Status:\*\*\s+([^(\n]+)"));
static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"\*\*Priority:\*\*\s+(\w+)"));
static AGENT_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)\*\*Agent:\*\*\s+([^→\n]+)"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)\*\*Estimated Time:\*\*\s+(.+)$"));
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"\d+"));
static CONTEXT_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)[\w/.]+\.(?:md|yaml|yml|py|tsx|ts|json)"));
static BLOCKS_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)\*\*Blocks:\*\*[ \t]*(.*)$"));
static BLOCKED_BY_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)\*\*Blocked By:\*\*[ \t]*(.*)$"));

const CONTEXT_HEADER: &str = "**Context to Read First:**";

/// `TASKS.md` files found one level below the workspace root.
#[derive(Debug, Clone)]
pub struct MarkdownBacklog {
    root: PathBuf,
    tasks_file: String,
}

impl MarkdownBacklog {
    pub fn new(root: impl Into<PathBuf>, tasks_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            tasks_file: tasks_file.into(),
        }
    }

    /// Backlog files of non-hidden project directories, sorted by project name.
    pub fn find_tasks_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("read workspace {}", self.root.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in {}", self.root.display()))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden || !path.is_dir() {
                continue;
            }
            let tasks_path = path.join(&self.tasks_file);
            if tasks_path.is_file() {
                files.push(tasks_path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl BacklogSource for MarkdownBacklog {
    fn tasks(&self) -> Vec<Task> {
        let files = match self.find_tasks_files() {
            Ok(files) => files,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "could not scan workspace for backlog files");
                return Vec::new();
            }
        };
        let mut tasks = Vec::new();
        for path in files {
            match read_tasks_file(&path) {
                Ok(parsed) => tasks.extend(parsed),
                Err(err) => warn!(error = %format!("{err:#}"), "skipping unreadable backlog file"),
            }
        }
        debug!(count = tasks.len(), "backlog loaded");
        tasks
    }
}

/// Parse one backlog file; the project is the name of its directory.
pub fn read_tasks_file(path: &Path) -> Result<Vec<Task>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let project = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(parse_tasks(&project, &contents))
}

/// Parse every `### <name>` section of `contents` into a task.
pub fn parse_tasks(project: &str, contents: &str) -> Vec<Task> {
    HEADING_RE
        .split(contents)
        .skip(1)
        .map(|section| parse_section(project, section))
        .collect()
}

fn parse_section(project: &str, section: &str) -> Task {
    let (heading, body) = section.split_once('\n').unwrap_or((section, ""));
    let name = heading.trim();

    let mut task = Task::new(task_id(project, name), name, project);
    task.status = capture(&STATUS_RE, body)
        .and_then(parse_status)
        .unwrap_or(TaskStatus::NotStarted);
    task.priority = capture(&PRIORITY_RE, body)
        .and_then(Priority::from_word)
        .unwrap_or(Priority::Medium);
    task.agent = capture(&AGENT_RE, body)
        .and_then(parse_agent)
        .unwrap_or(Agent::DEFAULT);
    task.estimated_minutes = capture(&TIME_RE, body)
        .and_then(parse_minutes)
        .unwrap_or(DEFAULT_MINUTES);
    task.description = body.chars().take(DESCRIPTION_CHARS).collect();
    task.context_files = context_files(body);
    task.blocks_tasks = capture(&BLOCKS_RE, body).map(id_list).unwrap_or_default();
    task.blocked_by = capture(&BLOCKED_BY_RE, body).map(id_list).unwrap_or_default();
    task
}

/// `{project}_{lowercased name with '_' for spaces, truncated}`.
pub fn task_id(project: &str, name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .take(ID_NAME_CHARS)
        .collect();
    format!("{project}_{slug}")
}

fn capture<'a>(re: &Regex, body: &'a str) -> Option<&'a str> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn parse_status(text: &str) -> Option<TaskStatus> {
    TaskStatus::ALL
        .into_iter()
        .find(|status| text.contains(status.label()))
}

fn parse_agent(text: &str) -> Option<Agent> {
    Agent::ALL.into_iter().find(|agent| text.contains(agent.label()))
}

/// Last integer in the text, in hours when the text says so.
fn parse_minutes(text: &str) -> Option<u32> {
    let last = NUMBER_RE.find_iter(text).last()?;
    let value: u32 = last.as_str().parse().ok()?;
    if text.to_lowercase().contains("hour") {
        value.checked_mul(60)
    } else {
        Some(value)
    }
}

/// File references listed under the context header, up to the next bold
/// field or heading.
fn context_files(body: &str) -> Vec<String> {
    let Some(start) = body.find(CONTEXT_HEADER) else {
        return Vec::new();
    };
    let after = &body[start + CONTEXT_HEADER.len()..];
    let Some(newline) = after.find('\n') else {
        return Vec::new();
    };
    if !after[..newline].trim().is_empty() {
        return Vec::new();
    }
    let block = &after[newline..];
    let end = [block.find("\n**"), block.find("\n###")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(block.len());
    CONTEXT_FILE_RE
        .find_iter(&block[..end])
        .map(|m| m.as_str().to_string())
        .collect()
}

fn id_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty() && !id.eq_ignore_ascii_case("none"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Tasks\n\nPreamble text.\n\n\
### Implement Motion Lights\n\
**Status:** In Progress (started Monday)\n\
**Priority:** High\n\
**Agent:** Claude Code → Codex\n\
**Estimated Time:** 1-2 hours\n\
**Blocks:** ha_dashboard, ha_alerts\n\
**Context to Read First:**\n\
- docs/lights.md\n\
- automations/motion.yaml\n\
\n\
**Notes:** see scripts/setup.py later\n\
\n\
### Tidy notes\n\
Nothing declared here.\n";

    #[test]
    fn parses_metadata_fields() {
        let tasks = parse_tasks("home", SAMPLE);
        assert_eq!(tasks.len(), 2);

        let t = &tasks[0];
        assert_eq!(t.id, "home_implement_motion_lights");
        assert_eq!(t.name, "Implement Motion Lights");
        assert_eq!(t.project, "home");
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.agent, Agent::ClaudeCode);
        assert_eq!(t.estimated_minutes, 120);
        assert_eq!(t.blocks_tasks, vec!["ha_dashboard", "ha_alerts"]);
        assert!(t.blocked_by.is_empty());
        assert_eq!(t.context_files, vec!["docs/lights.md", "automations/motion.yaml"]);
    }

    #[test]
    fn missing_metadata_uses_defaults() {
        let tasks = parse_tasks("home", SAMPLE);
        let t = &tasks[1];
        assert_eq!(t.status, TaskStatus::NotStarted);
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.agent, Agent::Codex);
        assert_eq!(t.estimated_minutes, 30);
        assert!(t.context_files.is_empty());
        assert!(t.description.starts_with("Nothing declared"));
    }

    #[test]
    fn malformed_metadata_falls_back() {
        let body = "### Odd task\n**Status:** whenever\n**Priority:** urgent\n**Agent:** Someone\n**Estimated Time:** soon\n";
        let t = &parse_tasks("p", body)[0];
        assert_eq!(t.status, TaskStatus::NotStarted);
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.agent, Agent::Codex);
        assert_eq!(t.estimated_minutes, 30);
    }

    #[test]
    fn minutes_take_last_number() {
        assert_eq!(parse_minutes("20-45 minutes"), Some(45));
        assert_eq!(parse_minutes("2 hours"), Some(120));
        assert_eq!(parse_minutes("about an hour"), None);
    }

    #[test]
    fn task_id_truncates_slug() {
        let id = task_id("proj", "Implement the very long task name that keeps going");
        assert_eq!(id, "proj_implement_the_very_long_task_n");
    }

    #[test]
    fn description_is_bounded() {
        let body = format!("### Long\n{}", "x".repeat(500));
        let t = &parse_tasks("p", &body)[0];
        assert_eq!(t.description.chars().count(), 200);
    }

    #[test]
    fn markdown_backlog_reads_project_dirs_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        for project in ["zeta", "alpha", ".hidden"] {
            fs::create_dir_all(root.join(project)).expect("mkdir");
            fs::write(
                root.join(project).join("TASKS.md"),
                format!("### {project} task\n**Priority:** Low\n"),
            )
            .expect("write");
        }
        fs::create_dir_all(root.join("empty")).expect("mkdir");

        let tasks = MarkdownBacklog::new(root, "TASKS.md").tasks();
        let projects: Vec<&str> = tasks.iter().map(|t| t.project.as_str()).collect();
        assert_eq!(projects, vec!["alpha", "zeta"]);
        assert_eq!(tasks[0].id, "alpha_alpha_task");
        assert_eq!(tasks[0].priority, Priority::Low);
    }

    #[test]
    fn missing_workspace_yields_no_tasks() {
        let temp = tempfile::tempdir().expect("tempdir");
        let backlog = MarkdownBacklog::new(temp.path().join("absent"), "TASKS.md");
        assert!(backlog.tasks().is_empty());
    }
}
