//! Which agent fills each decomposition role.

use serde::{Deserialize, Serialize};

use crate::task::Agent;

/// Role → agent assignments used when building subtask chains.
///
/// Loaded from the `[roles]` table of the router config. Roles that the task
/// itself owns (implementation, fixes, single-step work) always use the task's
/// preferred agent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleAssignments {
    /// Writes implementation plans.
    pub planner: Agent,
    /// Reviews code quality and conventions after implementation.
    pub code_reviewer: Agent,
    /// Tests, deploys and validates on the server.
    pub validator: Agent,
    /// Gathers sources before documentation work.
    pub researcher: Agent,
    /// Writes documents and drafts configuration YAML.
    pub documenter: Agent,
    /// Reviews logic, design and completeness.
    pub design_reviewer: Agent,
}

impl Default for RoleAssignments {
    fn default() -> Self {
        Self {
            planner: Agent::ChatGpt,
            code_reviewer: Agent::Codex,
            validator: Agent::ClaudeCode,
            researcher: Agent::Perplexity,
            documenter: Agent::Codex,
            design_reviewer: Agent::ChatGpt,
        }
    }
}
