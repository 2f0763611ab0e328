//! Stable exit codes for the `session-router` CLI.

/// A prompt was produced, the task is complete or blocked, or the operator's
/// selection was rejected without touching the ledger.
pub const OK: i32 = 0;
/// No workspace, no previous task to resume, or any other error.
pub const INVALID: i32 = 1;
