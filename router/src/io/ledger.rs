//! Ledger storage for scheduling progress (`.github/session_state.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use tracing::{debug, warn};

use crate::core::schedule::SchedulingState;

/// Load the ledger from disk.
///
/// A missing file is an empty ledger. An unreadable or corrupt file is also
/// treated as empty (with a warning); prior progress is lost in that case.
pub fn load_ledger(path: &Path) -> SchedulingState {
    debug!(path = %path.display(), "loading ledger");
    if !path.exists() {
        debug!("no ledger yet, starting empty");
        return SchedulingState::default();
    }
    match read_ledger(path) {
        Ok(state) => {
            debug!(
                last_task = ?state.last_task_id,
                completed = state.completed_subtasks.len(),
                "ledger loaded"
            );
            state
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring unreadable ledger");
            SchedulingState::default()
        }
    }
}

fn read_ledger(path: &Path) -> Result<SchedulingState> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read ledger {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse ledger {}", path.display()))
}

/// Stamp `last_updated` with the current local time and write the ledger.
pub fn save_ledger(path: &Path, state: &mut SchedulingState) -> Result<()> {
    state.touch(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false));
    write_ledger(path, state)
}

/// Atomically write the ledger as-is (temp file + rename).
pub fn write_ledger(path: &Path, state: &SchedulingState) -> Result<()> {
    debug!(
        path = %path.display(),
        last_subtask = ?state.last_subtask_id,
        completed = state.completed_subtasks.len(),
        "writing ledger"
    );
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("ledger path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp ledger {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace ledger {}", path.display()))?;
    Ok(())
}
