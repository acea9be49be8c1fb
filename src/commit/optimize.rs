//! Rewriting the latest commit's message when the model finds it lacking.
//!
//! The optimizer walks `CheckMerge -> CheckProvenance -> Analyze` and ends in
//! either an amend or a skip. Only the newest commit of the range is
//! considered.

use tracing::debug;

use crate::commit::diff::DiffCollector;
use crate::commit::prompt::review_prompt;
use crate::commit::provenance::ProvenanceTracker;
use crate::confirm::{Answer, ConfirmationGate, Gate, ask};
use crate::error::StageError;
use crate::git::{Commit, IgnoreSet, UpstreamBranch, VersionControl};
use crate::llm::{CommitReview, ModelClient};
use crate::progress::{ProgressExt, ProgressSink, Stage};
use crate::workflow::WorkflowSession;

const STAGE: Stage = Stage::CommitOptimization;

/// Why the optimizer left the commit untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No commits between the upstream and HEAD.
    NoCommits,
    Merge,
    AlreadyProcessed,
    /// Neither the commit nor the branch has reviewable changes.
    NoEligibleChanges,
    /// The model judged the message fine.
    Model { reason: String },
    /// The user declined the amend.
    User,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoCommits => "no-commits",
            SkipReason::Merge => "merge",
            SkipReason::AlreadyProcessed => "already-processed",
            SkipReason::NoEligibleChanges => "no-eligible-changes",
            SkipReason::Model { .. } => "model",
            SkipReason::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Amended {
        previous_hash: String,
        hash: String,
        message: String,
    },
    Skipped(SkipReason),
}

pub struct CommitOptimizer<'a> {
    git: &'a dyn VersionControl,
    model: &'a ModelClient,
    confirm: &'a dyn ConfirmationGate,
    progress: &'a dyn ProgressSink,
    ignore: &'a IgnoreSet,
}

impl<'a> CommitOptimizer<'a> {
    pub fn new(
        git: &'a dyn VersionControl,
        model: &'a ModelClient,
        confirm: &'a dyn ConfirmationGate,
        progress: &'a dyn ProgressSink,
        ignore: &'a IgnoreSet,
    ) -> Self {
        Self {
            git,
            model,
            confirm,
            progress,
            ignore,
        }
    }

    pub async fn optimize(
        &self,
        upstream: &UpstreamBranch,
        session: &mut WorkflowSession,
    ) -> Result<OptimizeOutcome, StageError> {
        let range = format!("{upstream}..HEAD");
        let commits = self.git.log(&range).await?;
        let Some(latest) = commits.into_iter().next() else {
            return Ok(self.skip(SkipReason::NoCommits));
        };
        debug!(hash = %latest.hash, "reviewing latest commit");

        // CheckMerge
        if latest.is_merge() {
            return Ok(self.skip(SkipReason::Merge));
        }

        // CheckProvenance
        let provenance = ProvenanceTracker::new(self.git);
        if provenance.is_marked(&latest.hash).await {
            return Ok(self.skip(SkipReason::AlreadyProcessed));
        }

        // Analyze
        let review = match self.analyze(upstream, &latest).await? {
            Some(review) => review,
            None => return Ok(self.skip(SkipReason::NoEligibleChanges)),
        };

        let Some(improved) = review.improved_message() else {
            provenance.mark(&latest.hash).await;
            return Ok(self.skip(SkipReason::Model {
                reason: review.reason,
            }));
        };
        let improved = improved.to_string();

        self.progress.info(
            STAGE,
            format!(
                "Current message:\n\n{}\n\nSuggested message:\n\n{improved}\n\nReason: {}",
                latest.message.trim(),
                review.reason
            ),
        );

        // Amend
        if let Answer::Declined(_) = ask(
            self.confirm,
            Gate::AmendCommit,
            "Amend the last commit with the suggested message?",
        )? {
            return Ok(self.skip(SkipReason::User));
        }

        let hash = self.git.amend_message(&improved).await?;
        provenance.mark(&hash).await;
        session.commit_optimized = true;
        self.progress.success(
            STAGE,
            format!(
                "Amended {} -> {}",
                latest.short_hash(),
                &hash[..hash.len().min(7)]
            ),
        );

        Ok(OptimizeOutcome::Amended {
            previous_hash: latest.hash,
            hash,
            message: improved,
        })
    }

    /// Ask the model for a verdict; `None` when there is nothing to show it.
    async fn analyze(
        &self,
        upstream: &UpstreamBranch,
        latest: &Commit,
    ) -> Result<Option<CommitReview>, StageError> {
        let diffs = DiffCollector::new(self.git, self.ignore);
        let commit_diff = diffs.single_commit_diff(&latest.hash).await?;
        let branch_diff = diffs.range_diff(&upstream.to_string(), "HEAD").await?;

        if commit_diff.is_empty() && branch_diff.is_empty() {
            return Ok(None);
        }

        let review: CommitReview = self
            .model
            .ask(&review_prompt(latest, &commit_diff, &branch_diff))
            .await?;
        Ok(Some(review))
    }

    fn skip(&self, reason: SkipReason) -> OptimizeOutcome {
        let message = match &reason {
            SkipReason::NoCommits => "No commits ahead of the upstream branch".to_string(),
            SkipReason::Merge => "Latest commit is a merge commit; leaving it as is".to_string(),
            SkipReason::AlreadyProcessed => "Latest commit was already reviewed".to_string(),
            SkipReason::NoEligibleChanges => {
                "Latest commit only touches ignored files; nothing to review".to_string()
            }
            SkipReason::Model { reason } => format!("Commit message looks good: {reason}"),
            SkipReason::User => "Amend skipped".to_string(),
        };
        self.progress.info(STAGE, message);
        OptimizeOutcome::Skipped(reason)
    }
}
