//! Router configuration stored under `.github/session_router.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::roles::RoleAssignments;

/// Router configuration (TOML).
///
/// Loaded once per process and passed to the session explicitly. Missing
/// fields default to the values the router ships with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouterConfig {
    /// Ledger location, relative to the workspace root.
    pub ledger_path: PathBuf,

    /// Backlog file name looked up in each project directory.
    pub tasks_file: String,

    /// Number of recent commits inspected when inferring the last task.
    pub history_window: usize,

    pub roles: RoleAssignments,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(".github/session_state.json"),
            tasks_file: "TASKS.md".to_string(),
            history_window: 5,
            roles: RoleAssignments::default(),
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ledger_path.as_os_str().is_empty() {
            return Err(anyhow!("ledger_path must not be empty"));
        }
        if self.tasks_file.trim().is_empty() {
            return Err(anyhow!("tasks_file must not be empty"));
        }
        if self.history_window == 0 {
            return Err(anyhow!("history_window must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// A missing file yields `RouterConfig::default()`. A file that does not parse
/// or fails validation is ignored with a warning and also yields the default;
/// only a failure to read an existing file is an error.
pub fn load_config(path: &Path) -> Result<RouterConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no router config, using defaults");
        return Ok(RouterConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    match parse_config(&contents) {
        Ok(cfg) => {
            debug!(path = %path.display(), ledger = %cfg.ledger_path.display(), "router config loaded");
            Ok(cfg)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring invalid router config");
            Ok(RouterConfig::default())
        }
    }
}

fn parse_config(contents: &str) -> Result<RouterConfig> {
    let cfg: RouterConfig = toml::from_str(contents).context("parse router config")?;
    cfg.validate()?;
    Ok(cfg)
}
