//! Multi-agent session router CLI.
//!
//! Without flags, shows the ranked backlog and asks for a task. `--next`
//! credits the last proposed subtask when the latest commit mentions it and
//! hands out the next one; `--last` re-renders the current subtask.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use session_router::exit_codes;
use session_router::logging;
use session_router::session::{SessionOutcome, SessionRouter};

const RULE: &str = "======================================================================";

#[derive(Parser, Debug)]
#[command(
    name = "session-router",
    version,
    about = "Route backlog work to agents one subtask at a time"
)]
struct Cli {
    /// Credit the last subtask if the latest commit mentions it, then continue.
    #[arg(long, conflicts_with = "last")]
    next: bool,

    /// Re-render the current subtask of the last task.
    #[arg(long)]
    last: bool,

    /// Workspace root (must contain `.github/`).
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    workspace: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interactive,
    Next,
    Last,
}

impl Cli {
    fn mode(&self) -> Mode {
        match (self.next, self.last) {
            (true, _) => Mode::Next,
            (_, true) => Mode::Last,
            _ => Mode::Interactive,
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let mut router = SessionRouter::open(&cli.workspace)?;
    let mode = cli.mode();
    let outcome = match mode {
        Mode::Next => router.continue_last()?,
        Mode::Last => router.reprocess_last()?,
        Mode::Interactive => router.interactive(&mut io::stdin().lock(), &mut io::stdout().lock())?,
    };
    Ok(report(mode, outcome))
}

/// Print the outcome and pick the exit code.
fn report(mode: Mode, outcome: SessionOutcome) -> i32 {
    match outcome {
        SessionOutcome::Assigned(assignment) => {
            let title = match mode {
                Mode::Next => "NEXT TASK PROMPT",
                Mode::Last => "TASK PROMPT",
                Mode::Interactive => "TASK PROMPT (Copy & Paste into Agent)",
            };
            println!("\n{RULE}\n{title}\n{RULE}\n");
            println!("{}", assignment.prompt);
            if mode == Mode::Interactive {
                println!(
                    "\n{RULE}\nTIP: Copy the prompt above and paste it into {}\n{RULE}\n",
                    assignment.agent
                );
            }
            exit_codes::OK
        }
        SessionOutcome::Complete { task } => {
            println!("\nTask '{task}' is already complete!");
            exit_codes::OK
        }
        SessionOutcome::Blocked { task } => {
            println!("\nTask '{task}' is blocked: no subtask has its dependencies met.");
            exit_codes::OK
        }
        SessionOutcome::NoPreviousTask => {
            eprintln!("No previous task found. Run without --next or --last to select a task.");
            exit_codes::INVALID
        }
        SessionOutcome::TaskNotFound(id) => {
            eprintln!("Could not find task: {id}");
            exit_codes::INVALID
        }
        SessionOutcome::InvalidSelection(err) => {
            println!("\nInvalid choice: {err}.");
            exit_codes::OK
        }
        SessionOutcome::Aborted => {
            println!("\nAborted.");
            exit_codes::OK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_interactive_in_cwd() {
        let cli = Cli::parse_from(["session-router"]);
        assert_eq!(cli.mode(), Mode::Interactive);
        assert_eq!(cli.workspace, PathBuf::from("."));
    }

    #[test]
    fn parse_next_and_workspace() {
        let cli = Cli::parse_from(["session-router", "--next", "-C", "/tmp/ws"]);
        assert_eq!(cli.mode(), Mode::Next);
        assert_eq!(cli.workspace, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn parse_last() {
        let cli = Cli::parse_from(["session-router", "--last"]);
        assert_eq!(cli.mode(), Mode::Last);
    }

    #[test]
    fn next_and_last_conflict() {
        assert!(Cli::try_parse_from(["session-router", "--next", "--last"]).is_err());
    }

    #[test]
    fn missing_previous_task_is_invalid() {
        assert_eq!(report(Mode::Next, SessionOutcome::NoPreviousTask), exit_codes::INVALID);
        assert_eq!(
            report(Mode::Last, SessionOutcome::TaskNotFound("x".to_string())),
            exit_codes::INVALID
        );
        assert_eq!(report(Mode::Interactive, SessionOutcome::Aborted), exit_codes::OK);
    }
}
