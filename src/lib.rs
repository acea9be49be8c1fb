//! prpilot - turn local work into reviewed commits and an open pull request.
//!
//! # Overview
//!
//! A run resolves the branch the pull request targets, commits uncommitted
//! changes with a drafted message, reviews the latest commit's message, and
//! finally opens a pull request or refreshes the one already open. A language
//! model (Claude Code or Codex CLI) drafts every message; git and the GitHub
//! CLI do the rest.

pub mod branch;
pub mod claude;
pub mod codex;
pub mod commit;
pub mod config;
pub mod confirm;
pub mod error;
pub mod git;
pub mod github;
pub mod llm;
pub mod logging;
pub mod pr;
pub mod progress;
#[cfg(test)]
pub mod test_support;
pub mod workflow;

// Re-export commonly used types
pub use config::Settings;
pub use error::{StageError, WorkflowError};
pub use git::{GitCli, IgnoreSet, UpstreamBranch};
pub use github::GhCli;
pub use pr::{ManualInstructions, PrOutcome};
pub use workflow::{RunOptions, RunOutcome, RunReport, Workflow};
