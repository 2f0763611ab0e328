//! Multi-agent session router.
//!
//! Decomposes a backlog task into an ordered chain of role-specific subtasks,
//! tracks completed subtasks across independent invocations, and hands out
//! exactly one next actionable subtask per invocation as a rendered prompt.
//!
//! - **[`core`]**: Pure, deterministic logic (decomposition, gating, ranking).
//!   No I/O.
//! - **[`io`]**: Side effects (ledger and config files, TASKS.md parsing, git).
//!
//! [`session`] coordinates the two for one CLI invocation; [`prompt`] renders
//! the instruction document and [`select`] the interactive menu.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod prompt;
pub mod select;
pub mod session;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
