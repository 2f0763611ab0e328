//! Orchestration of one router invocation.
//!
//! A [`SessionRouter`] loads the ledger once, hands out at most one subtask,
//! and persists the ledger after each mutation. It holds no state between
//! invocations beyond what is written to disk.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::decompose::DecompositionEngine;
use crate::core::ranking::rank_backlog;
use crate::core::schedule::{CompletionOracle, SchedulingState, TaskProgress};
use crate::io::backlog::{BacklogSource, MarkdownBacklog};
use crate::io::config::{RouterConfig, load_config};
use crate::io::git::Git;
use crate::io::history::{GitHistory, LastTaskHint};
use crate::io::ledger::{load_ledger, save_ledger};
use crate::io::workspace::{WorkspacePaths, ensure_workspace};
use crate::prompt::PromptAssembler;
use crate::select::{SelectionError, parse_choice, render_backlog};
use crate::task::{Agent, Task};

/// The subtask handed out by an invocation, with its rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub task_id: String,
    pub subtask_id: String,
    pub agent: Agent,
    pub prompt: String,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A subtask was proposed and recorded in the ledger.
    Assigned(Assignment),
    /// Every subtask of the task is complete.
    Complete { task: String },
    /// Subtasks remain but none has its dependencies met.
    Blocked { task: String },
    /// `--next`/`--last` without a last task in the ledger.
    NoPreviousTask,
    /// The ledger names a task the backlog no longer contains.
    TaskNotFound(String),
    /// Interactive input did not name a menu option.
    InvalidSelection(SelectionError),
    /// Interactive input ended before a choice was made.
    Aborted,
}

/// Router for one invocation against a workspace.
pub struct SessionRouter<B, H> {
    paths: WorkspacePaths,
    state: SchedulingState,
    engine: DecompositionEngine,
    prompts: PromptAssembler,
    backlog: B,
    history: H,
}

impl SessionRouter<MarkdownBacklog, GitHistory> {
    /// Open the workspace at `root` with its TASKS.md backlog and git history.
    pub fn open(root: &Path) -> Result<Self> {
        ensure_workspace(root)?;
        let paths = WorkspacePaths::new(root);
        let config = load_config(&paths.config_path).context("load router config")?;
        let paths = paths.with_config(&config);
        let backlog = MarkdownBacklog::new(&paths.root, config.tasks_file.clone());
        let history = GitHistory::new(Git::new(&paths.root), config.history_window);
        Self::new(paths, &config, backlog, history)
    }
}

impl<B, H> SessionRouter<B, H>
where
    B: BacklogSource,
    H: CompletionOracle + LastTaskHint,
{
    pub fn new(paths: WorkspacePaths, config: &RouterConfig, backlog: B, history: H) -> Result<Self> {
        let state = load_ledger(&paths.ledger_path);
        let engine = DecompositionEngine::new(config.roles);
        let prompts = PromptAssembler::new()?;
        Ok(Self {
            paths,
            state,
            engine,
            prompts,
            backlog,
            history,
        })
    }

    pub fn state(&self) -> &SchedulingState {
        &self.state
    }

    pub fn ledger_path(&self) -> &Path {
        &self.paths.ledger_path
    }

    /// Hand out the next actionable subtask of `task`.
    ///
    /// The ledger is only written when a subtask is proposed.
    #[instrument(skip_all, fields(task = %task.id))]
    pub fn process_task(&mut self, task: &Task) -> Result<SessionOutcome> {
        let subtasks = task.subtasks(&self.engine);
        let subtask = match self.state.progress(subtasks) {
            TaskProgress::Ready(subtask) => subtask,
            TaskProgress::Complete => {
                info!("task already complete");
                return Ok(SessionOutcome::Complete {
                    task: task.name.clone(),
                });
            }
            TaskProgress::Blocked => {
                info!("no subtask has its dependencies met");
                return Ok(SessionOutcome::Blocked {
                    task: task.name.clone(),
                });
            }
        };

        let prompt = self
            .prompts
            .render(task, subtasks, subtask, &self.state)
            .with_context(|| format!("render prompt for {}", subtask.id))?;
        self.state.record_proposal(task, subtask);
        self.save()?;

        Ok(SessionOutcome::Assigned(Assignment {
            task_id: task.id.clone(),
            subtask_id: subtask.id.clone(),
            agent: subtask.agent,
            prompt,
        }))
    }

    /// `--next`: credit the last proposal if history mentions it, then advance.
    pub fn continue_last(&mut self) -> Result<SessionOutcome> {
        let task = match self.last_task() {
            Ok(task) => task,
            Err(outcome) => return Ok(outcome),
        };
        if let Some(marked) = self.state.infer_completion_from_history(&self.history) {
            debug!(subtask = %marked, "history confirms last subtask");
            self.save()?;
        }
        self.process_task(&task)
    }

    /// `--last`: re-render the current subtask of the last task without
    /// consulting history.
    pub fn reprocess_last(&mut self) -> Result<SessionOutcome> {
        match self.last_task() {
            Ok(task) => self.process_task(&task),
            Err(outcome) => Ok(outcome),
        }
    }

    /// Interactive mode: show the ranked backlog on `output`, read one line
    /// from `input`, and process the chosen task.
    pub fn interactive<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<SessionOutcome> {
        let tasks = self.backlog.tasks();
        if self.state.last_task_id.is_none() {
            if let Some(inferred) = self.history.infer_last_task(&tasks) {
                debug!(task = %inferred, "inferred last task from history");
                self.state.last_task_id = Some(inferred);
                self.save()?;
            }
        }

        let view = rank_backlog(&tasks, &self.state);
        output
            .write_all(render_backlog(&view, &self.state).as_bytes())
            .context("write backlog menu")?;
        output.flush().context("flush backlog menu")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("read task choice")?;
        if read == 0 {
            return Ok(SessionOutcome::Aborted);
        }
        let task = match parse_choice(&line, &view) {
            Ok(task) => task.clone(),
            Err(err) => {
                debug!(error = %err, "invalid selection");
                return Ok(SessionOutcome::InvalidSelection(err));
            }
        };
        self.process_task(&task)
    }

    /// The ledger's last task, resolved against the current backlog.
    fn last_task(&self) -> std::result::Result<Task, SessionOutcome> {
        let Some(id) = self.state.last_task_id.clone() else {
            return Err(SessionOutcome::NoPreviousTask);
        };
        self.backlog
            .tasks()
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(SessionOutcome::TaskNotFound(id))
    }

    fn save(&mut self) -> Result<()> {
        save_ledger(&self.paths.ledger_path, &mut self.state)
    }
}
