//! Error types for prpilot modules using thiserror.

use thiserror::Error;

/// Errors from version-control operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to read repository state: {0}")]
    Repository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error(
        "Push of '{branch}' to {remote} was rejected because the remote has commits this branch lacks. \
         Pull or rebase onto {remote}/{branch}, then run prpilot again: {stderr}"
    )]
    PushRejected {
        remote: String,
        branch: String,
        stderr: String,
    },
}

/// Errors from language-model backends.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown provider '{name}'. Available: {available}")]
    UnknownProvider { name: String, available: String },

    #[error("{provider} CLI not found. {hint}")]
    NotInstalled {
        provider: &'static str,
        hint: &'static str,
    },

    #[error("Failed to spawn {provider} process: {source}")]
    SpawnFailed {
        provider: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{provider} process timed out after {secs} seconds")]
    Timeout { provider: &'static str, secs: u64 },

    #[error("{provider} CLI exited with code {code}: {stderr}")]
    NonZeroExit {
        provider: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("{provider} CLI reported an error: {message}")]
    ExecutionFailed {
        provider: &'static str,
        message: String,
    },
}

/// The model answered, but not with the JSON shape the call site asked for.
#[derive(Error, Debug)]
pub enum ResponseFormatError {
    #[error("{schema} response is not valid JSON: {source}. Response: {excerpt}")]
    InvalidJson {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("{schema} response failed validation: {reason}")]
    Invalid {
        schema: &'static str,
        reason: String,
    },
}

/// Errors from the remote host CLI (`gh`).
#[derive(Error, Debug)]
pub enum HostError {
    #[error("GitHub CLI (gh) not installed. Install from https://cli.github.com")]
    NotInstalled,

    #[error("Not authenticated with GitHub CLI. Run 'gh auth login' first")]
    NotAuthenticated,

    #[error("Failed to run gh {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gh {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("Could not parse gh {operation} output: {detail}")]
    UnexpectedOutput { operation: String, detail: String },
}

/// Errors from upstream branch resolution.
#[derive(Error, Debug)]
pub enum BranchError {
    #[error("No remote branches found. Push a branch or add a remote first.")]
    NoRemoteBranches,

    #[error("Could not read branch tracking information: {0}")]
    NoTrackingInfo(#[source] GitError),

    #[error("Could not list remote branches: {0}")]
    ListFailed(#[source] GitError),
}

/// Errors surfaced by a workflow stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    ResponseFormat(#[from] ResponseFormatError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Branch(#[from] BranchError),

    #[error("Interactive prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

/// A stage failure tagged with the stage it happened in.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct WorkflowError {
    pub stage: crate::progress::Stage,
    #[source]
    pub source: StageError,
}

impl WorkflowError {
    pub fn new(stage: crate::progress::Stage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
