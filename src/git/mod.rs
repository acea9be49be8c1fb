//! Version-control adapter: the narrow git surface the workflow consumes.

pub mod cli;
pub mod ignore;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;

use crate::error::GitError;

pub use cli::GitCli;
pub use ignore::IgnoreSet;

/// Paths with pending changes, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    pub modified: BTreeSet<String>,
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    /// Post-rename paths.
    pub renamed: BTreeSet<String>,
    /// Pre-rename path of each entry in `renamed`.
    pub renamed_from: BTreeMap<String, String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty()
            && self.added.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
    }

    /// Every changed path, sorted and de-duplicated.
    pub fn changed_paths(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self
            .modified
            .iter()
            .chain(&self.added)
            .chain(&self.deleted)
            .chain(&self.renamed)
            .collect();
        all.into_iter().cloned().collect()
    }
}

/// A commit as the workflow sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    /// Parent hashes in order; more than one means a merge commit.
    pub parents: Vec<String>,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}

/// A remote-qualified branch such as `origin/main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBranch {
    pub remote: String,
    pub branch: String,
}

impl UpstreamBranch {
    /// Split `origin/feature/x` into remote `origin` and branch `feature/x`.
    pub fn parse(name: &str) -> Option<Self> {
        let (remote, branch) = name.trim().split_once('/')?;
        if remote.is_empty() || branch.is_empty() {
            return None;
        }
        Some(Self {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }
}

impl fmt::Display for UpstreamBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// How a branch is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Fast-forward only.
    Plain,
    /// Fast-forward only, and record the remote branch as upstream.
    SetUpstream,
    /// Replace already-pushed history unless the remote moved since the last
    /// fetch.
    ForceWithLease { set_upstream: bool },
}

/// Operations for interacting with the local repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn status(&self) -> Result<WorkingTreeStatus, GitError>;

    async fn current_branch(&self) -> Result<String, GitError>;

    /// Configured upstream of a local branch, as `remote/branch`.
    async fn tracking_branch(&self, branch: &str) -> Result<Option<String>, GitError>;

    async fn local_branches(&self) -> Result<Vec<String>, GitError>;

    /// Remote branches as `remote/branch`, including symbolic entries such as `origin/HEAD`.
    async fn remote_branches(&self) -> Result<Vec<String>, GitError>;

    async fn rev_parse(&self, rev: &str) -> Result<String, GitError>;

    /// Staged (`staged = true`) or unstaged diff of a single path.
    ///
    /// The staged diff of a renamed path shows the rename from its old path.
    async fn diff_path(&self, path: &str, staged: bool) -> Result<String, GitError>;

    /// Diff between two revisions, minus the excluded pathspecs.
    async fn diff_range(&self, from: &str, to: &str, exclude: &[String])
    -> Result<String, GitError>;

    /// Patch introduced by a single commit, minus the excluded pathspecs.
    async fn show(&self, hash: &str, exclude: &[String]) -> Result<String, GitError>;

    /// Commits in `range` (e.g. `origin/main..HEAD`), newest first.
    async fn log(&self, range: &str) -> Result<Vec<Commit>, GitError>;

    async fn add(&self, paths: &[String]) -> Result<(), GitError>;

    /// Commit the index; returns the new commit hash.
    async fn commit(&self, message: &str) -> Result<String, GitError>;

    /// Replace the last commit's message, keeping its tree; returns the new hash.
    async fn amend_message(&self, message: &str) -> Result<String, GitError>;

    async fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<(), GitError>;

    async fn checkout_new_branch(&self, name: &str) -> Result<(), GitError>;

    /// Attach (overwriting) a note to `hash` under `notes_ref`.
    async fn add_note(&self, notes_ref: &str, hash: &str, body: &str) -> Result<(), GitError>;

    /// Note body for `hash` under `notes_ref`, `None` if there is none.
    async fn show_note(&self, notes_ref: &str, hash: &str) -> Result<Option<String>, GitError>;
}
