//! Canonical paths within a router workspace.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::io::config::RouterConfig;

/// Directory that marks a workspace root.
pub const GITHUB_DIR: &str = ".github";
/// Router config file name inside [`GITHUB_DIR`].
pub const CONFIG_FILE: &str = "session_router.toml";

/// Resolved paths for a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub ledger_path: PathBuf,
}

impl WorkspacePaths {
    /// Paths for `root` with the default ledger location.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_path: root.join(GITHUB_DIR).join(CONFIG_FILE),
            ledger_path: root.join(RouterConfig::default().ledger_path),
            root,
        }
    }

    /// Take the ledger location from a loaded `config`.
    pub fn with_config(mut self, config: &RouterConfig) -> Self {
        self.ledger_path = self.root.join(&config.ledger_path);
        self
    }
}

/// Fail unless `root` looks like a router workspace (has `.github/`).
pub fn ensure_workspace(root: &Path) -> Result<()> {
    let github_dir = root.join(GITHUB_DIR);
    if !github_dir.is_dir() {
        return Err(anyhow!(
            "not a valid workspace: no {GITHUB_DIR}/ directory in {}",
            root.display()
        ));
    }
    Ok(())
}
