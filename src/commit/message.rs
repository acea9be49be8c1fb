//! Turning uncommitted changes into a commit with a drafted message.

use tracing::debug;

use crate::commit::diff::DiffCollector;
use crate::commit::prompt::draft_prompt;
use crate::commit::provenance::ProvenanceTracker;
use crate::confirm::{Answer, ConfirmationGate, Gate, ask};
use crate::error::StageError;
use crate::git::{IgnoreSet, VersionControl, WorkingTreeStatus};
use crate::llm::{CommitMessageDraft, ModelClient};
use crate::progress::{ProgressExt, ProgressSink, Stage};
use crate::workflow::WorkflowSession;

const STAGE: Stage = Stage::UncommittedChanges;

/// What happened to the uncommitted changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// Every changed path was ignored or had no diff; nothing was sent to the model.
    NothingEligible,
    /// The user turned the drafted message down.
    Declined,
    Committed { hash: String, message: String },
}

pub struct CommitDrafter<'a> {
    git: &'a dyn VersionControl,
    model: &'a ModelClient,
    confirm: &'a dyn ConfirmationGate,
    progress: &'a dyn ProgressSink,
    ignore: &'a IgnoreSet,
}

impl<'a> CommitDrafter<'a> {
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

    /// Draft a message for the pending changes and commit them on confirmation.
    ///
    /// All changed paths are staged, including ignored ones; the ignore set
    /// only keeps them out of the prompt.
    pub async fn commit_changes(
        &self,
        status: &WorkingTreeStatus,
        session: &mut WorkflowSession,
    ) -> Result<DraftOutcome, StageError> {
        let paths = status.changed_paths();
        self.progress
            .info(STAGE, format!("{} changed file(s) found", paths.len()));

        let diff = DiffCollector::new(self.git, self.ignore)
            .uncommitted_diff(&paths)
            .await;
        for path in &diff.skipped {
            self.progress
                .warning(STAGE, format!("Skipped {path}: no diff available"));
        }
        if diff.is_empty() {
            self.progress.warning(
                STAGE,
                "No reviewable changes (only ignored or empty files); leaving them uncommitted",
            );
            return Ok(DraftOutcome::NothingEligible);
        }

        let branch = self.git.current_branch().await?;
        debug!(files = diff.files.len(), branch = %branch, "drafting commit message");
        let draft: CommitMessageDraft = self.model.ask(&draft_prompt(&diff, &branch)).await?;
        let message = draft.commit_message.trim().to_string();

        self.progress
            .info(STAGE, format!("Proposed commit message:\n\n{message}\n"));

        let prompt = format!("Commit {} file(s) with this message?", paths.len());
        if let Answer::Declined(_) = ask(self.confirm, Gate::CommitChanges, &prompt)? {
            self.progress.warning(STAGE, "Commit skipped");
            return Ok(DraftOutcome::Declined);
        }

        self.git.add(&paths).await?;
        let hash = self.git.commit(&message).await?;
        ProvenanceTracker::new(self.git).mark(&hash).await;
        session.commit_created = true;

        self.progress.success(
            STAGE,
            format!("Created commit {}", &hash[..hash.len().min(7)]),
        );
        Ok(DraftOutcome::Committed { hash, message })
    }
}
