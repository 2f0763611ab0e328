//! Git adapter for reading recent workspace history.
//!
//! The router only reads history; it never commits or changes branches.

use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Full message (subject and body) of `HEAD`, or `None` in a repo without commits.
    #[instrument(skip_all)]
    pub fn last_commit_message(&self) -> Result<Option<String>> {
        if !self.has_commits()? {
            debug!("repository has no commits");
            return Ok(None);
        }
        let out = self.run_capture(&["log", "-1", "--format=%B"])?;
        Ok(Some(out.trim().to_string()))
    }

    /// Subjects of the `limit` most recent commits, newest first.
    #[instrument(skip_all, fields(limit))]
    pub fn recent_commit_subjects(&self, limit: usize) -> Result<Vec<String>> {
        if !self.has_commits()? {
            return Ok(Vec::new());
        }
        let arg = format!("-{limit}");
        let out = self.run_capture(&["log", &arg, "--format=%s"])?;
        let subjects: Vec<String> = out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = subjects.len(), "read recent commit subjects");
        Ok(subjects)
    }

    fn has_commits(&self) -> Result<bool> {
        let status = self.run(&["rev-parse", "--verify", "--quiet", "HEAD"])?.status;
        Ok(status.success())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}
