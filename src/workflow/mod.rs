//! The end-to-end run: branch resolution, uncommitted changes, commit
//! optimization and the pull request, strictly in that order.
//!
//! Stages share a [`WorkflowSession`] passed by `&mut`. A failing stage ends
//! the run with a [`WorkflowError`] naming the stage, except commit
//! optimization: its failure is reported and the pull-request stage still runs.

pub mod session;

use tracing::{debug, warn};

use crate::branch::{BranchResolver, Resolution};
use crate::commit::{CommitDrafter, CommitOptimizer, DraftOutcome, OptimizeOutcome};
use crate::confirm::ConfirmationGate;
use crate::error::WorkflowError;
use crate::git::{IgnoreSet, UpstreamBranch, VersionControl};
use crate::github::RemoteHost;
use crate::llm::ModelClient;
use crate::pr::{PrOutcome, PullRequestManager};
use crate::progress::{ProgressExt, ProgressSink, Stage};

pub use session::WorkflowSession;

/// Caller-facing switches for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Answer yes at every gate and take default selections.
    pub auto_confirm: bool,
    /// Open new pull requests as drafts.
    pub draft: bool,
}

/// What a completed run did, stage by stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub upstream: UpstreamBranch,
    /// `None` when the working tree was clean.
    pub commit: Option<DraftOutcome>,
    /// `None` when optimization failed; the failure went to the progress sink.
    pub optimization: Option<OptimizeOutcome>,
    pub pull_request: PrOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The user declined a gate whose policy ends the run.
    Cancelled,
}

pub struct Workflow<'a> {
    git: &'a dyn VersionControl,
    host: &'a dyn RemoteHost,
    model: &'a ModelClient,
    confirm: &'a dyn ConfirmationGate,
    progress: &'a dyn ProgressSink,
    ignore: &'a IgnoreSet,
}

impl<'a> Workflow<'a> {
    pub fn new(
        git: &'a dyn VersionControl,
        host: &'a dyn RemoteHost,
        model: &'a ModelClient,
        confirm: &'a dyn ConfirmationGate,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            git,
            host,
            model,
            confirm,
            progress,
            ignore: IgnoreSet::standard(),
        }
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome, WorkflowError> {
        debug!(
            provider = self.model.provider_name(),
            draft = options.draft,
            auto_confirm = options.auto_confirm,
            "starting run"
        );
        let mut session = WorkflowSession::default();

        let resolution = BranchResolver::new(self.git, self.confirm, self.progress)
            .resolve()
            .await
            .map_err(|e| WorkflowError::new(Stage::BranchResolution, e))?;
        let upstream = match resolution {
            Resolution::Selected(upstream) => upstream,
            Resolution::Cancelled => return Ok(RunOutcome::Cancelled),
        };

        let commit = self.handle_uncommitted(&mut session).await?;

        let optimization = match CommitOptimizer::new(
            self.git,
            self.model,
            self.confirm,
            self.progress,
            self.ignore,
        )
        .optimize(&upstream, &mut session)
        .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("commit optimization failed: {e}");
                self.progress.error(
                    Stage::CommitOptimization,
                    format!("Commit optimization failed: {e}"),
                );
                None
            }
        };

        let pull_request = PullRequestManager::new(
            self.git,
            self.host,
            self.model,
            self.confirm,
            self.progress,
            self.ignore,
        )
        .create_or_update(&upstream, options.draft, &session)
        .await
        .map_err(|e| WorkflowError::new(Stage::PullRequest, e))?;

        Ok(RunOutcome::Completed(RunReport {
            upstream,
            commit,
            optimization,
            pull_request,
        }))
    }

    async fn handle_uncommitted(
        &self,
        session: &mut WorkflowSession,
    ) -> Result<Option<DraftOutcome>, WorkflowError> {
        let stage = Stage::UncommittedChanges;
        let status = self
            .git
            .status()
            .await
            .map_err(|e| WorkflowError::new(stage, e))?;
        if status.is_clean() {
            self.progress.info(stage, "Working tree clean");
            return Ok(None);
        }

        CommitDrafter::new(self.git, self.model, self.confirm, self.progress, self.ignore)
            .commit_changes(&status, session)
            .await
            .map(Some)
            .map_err(|e| WorkflowError::new(stage, e))
    }
}
