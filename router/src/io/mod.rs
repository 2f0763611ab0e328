//! I/O helpers for router commands.

pub mod backlog;
pub mod config;
pub mod git;
pub mod history;
pub mod ledger;
pub mod workspace;
