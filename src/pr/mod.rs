//! Opening a new pull request or refreshing the one already open.

pub mod prompt;

use tracing::debug;

use crate::commit::diff::DiffCollector;
use crate::confirm::{Answer, ConfirmationGate, Gate, ask};
use crate::error::{HostError, StageError};
use crate::git::{Commit, IgnoreSet, PushMode, UpstreamBranch, VersionControl};
use crate::github::{NewPullRequest, PullRequestEdit, PullRequestRecord, RemoteHost};
use crate::llm::schema::MAX_BRANCH_CHARS;
use crate::llm::{DescriptionUpdate, ModelClient, PullRequestProposal};
use crate::progress::{ProgressExt, ProgressSink, Stage};
use crate::workflow::WorkflowSession;

use self::prompt::{proposal_prompt, update_prompt};

const STAGE: Stage = Stage::PullRequest;

/// What to paste into the host UI when the PR could not be opened automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualInstructions {
    pub title: String,
    pub description: String,
    /// Head branch.
    pub from: String,
    /// Base branch.
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrSkip {
    /// Nothing differs from the target branch.
    NoChanges,
    PushDeclined,
    CreateDeclined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    Created(PullRequestRecord),
    /// Pushed to an open PR and rewrote its title and description.
    Updated(PullRequestRecord),
    /// Pushed to an open PR, description left as it was.
    Pushed(PullRequestRecord),
    Manual(ManualInstructions),
    Skipped(PrSkip),
}

/// `suggested`, or the first `suggested-N` not taken by a local branch.
pub fn unique_branch_name(suggested: &str, local_branches: &[String]) -> String {
    let taken = |name: &str| local_branches.iter().any(|b| b == name);
    if !taken(suggested) {
        return suggested.to_string();
    }

    (2..)
        .map(|n| {
            let suffix = format!("-{n}");
            let keep = MAX_BRANCH_CHARS.saturating_sub(suffix.len());
            let stem: String = suggested.chars().take(keep).collect();
            format!("{}{suffix}", stem.trim_end_matches(['-', '/']))
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| suggested.to_string())
}

/// An amend earlier in the run rewrote a commit the remote may already have.
fn rewrite_mode(session: &WorkflowSession, mode: PushMode) -> PushMode {
    match mode {
        PushMode::Plain if session.commit_optimized => PushMode::ForceWithLease {
            set_upstream: false,
        },
        PushMode::SetUpstream if session.commit_optimized => PushMode::ForceWithLease {
            set_upstream: true,
        },
        other => other,
    }
}

pub struct PullRequestManager<'a> {
    git: &'a dyn VersionControl,
    host: &'a dyn RemoteHost,
    model: &'a ModelClient,
    confirm: &'a dyn ConfirmationGate,
    progress: &'a dyn ProgressSink,
    ignore: &'a IgnoreSet,
}

impl<'a> PullRequestManager<'a> {
    pub fn new(
        git: &'a dyn VersionControl,
        host: &'a dyn RemoteHost,
        model: &'a ModelClient,
        confirm: &'a dyn ConfirmationGate,
        progress: &'a dyn ProgressSink,
        ignore: &'a IgnoreSet,
    ) -> Self {
        Self {
            git,
            host,
            model,
            confirm,
            progress,
            ignore,
        }
    }

    pub async fn create_or_update(
        &self,
        upstream: &UpstreamBranch,
        draft: bool,
        session: &WorkflowSession,
    ) -> Result<PrOutcome, StageError> {
        let current = self.git.current_branch().await?;
        let host_ready = self.host_ready().await;

        if host_ready {
            match self.host.find_open_pr(&current).await {
                Ok(Some(record)) => {
                    self.progress.info(
                        STAGE,
                        format!("Found open PR #{}: {}", record.number, record.title),
                    );
                    return self.update_existing(upstream, &current, record, session).await;
                }
                Ok(None) => debug!(branch = %current, "no open PR for branch"),
                Err(e) => self.progress.warning(
                    STAGE,
                    format!("Could not look up open pull requests: {e}"),
                ),
            }
        }

        self.create_new(upstream, &current, draft, host_ready, session)
            .await
    }

    async fn host_ready(&self) -> bool {
        let status = if !self.host.is_installed().await {
            Err(HostError::NotInstalled)
        } else if !self.host.is_authenticated().await {
            Err(HostError::NotAuthenticated)
        } else {
            Ok(())
        };

        match status {
            Ok(()) => true,
            Err(e) => {
                self.progress.warning(
                    STAGE,
                    format!("{e}; the pull request will need to be opened manually"),
                );
                false
            }
        }
    }

    async fn update_existing(
        &self,
        upstream: &UpstreamBranch,
        current: &str,
        record: PullRequestRecord,
        session: &WorkflowSession,
    ) -> Result<PrOutcome, StageError> {
        let remote = match self.git.tracking_branch(current).await {
            Ok(Some(tracking)) => UpstreamBranch::parse(&tracking)
                .map(|t| t.remote)
                .unwrap_or_else(|| upstream.remote.clone()),
            _ => upstream.remote.clone(),
        };

        let prompt = format!("Push '{current}' to PR #{}?", record.number);
        if let Answer::Declined(_) = ask(self.confirm, Gate::PushToExistingPr, &prompt)? {
            self.progress.warning(STAGE, "Push skipped");
            return Ok(PrOutcome::Skipped(PrSkip::PushDeclined));
        }

        // Read before pushing; afterwards the remote ref already has them.
        let pending = match self.git.log(&format!("{remote}/{current}..HEAD")).await {
            Ok(commits) => commits,
            Err(e) => {
                debug!("could not list unpushed commits: {e}");
                Vec::new()
            }
        };

        self.git
            .push(&remote, current, rewrite_mode(session, PushMode::Plain))
            .await?;
        self.progress
            .success(STAGE, format!("Pushed {current} to {remote}"));

        if pending.is_empty() && !session.touched_commits() {
            self.progress
                .info(STAGE, "No new commits; description left unchanged");
            return Ok(PrOutcome::Pushed(record));
        }

        let prompt = format!("Regenerate the title and description of PR #{}?", record.number);
        if let Answer::Declined(_) = ask(self.confirm, Gate::RegenerateDescription, &prompt)? {
            return Ok(PrOutcome::Pushed(record));
        }

        let update = self.draft_update(upstream, &record, pending).await?;
        self.progress.info(
            STAGE,
            format!(
                "Proposed title: {}\n\n{}",
                update.updated_title, update.updated_description
            ),
        );

        if let Answer::Declined(_) = ask(
            self.confirm,
            Gate::ApplyDescription,
            "Apply this title and description?",
        )? {
            return Ok(PrOutcome::Pushed(record));
        }

        let edit = PullRequestEdit {
            title: Some(update.updated_title.clone()),
            body: Some(update.updated_description),
        };
        self.host.edit_pr(record.number, &edit).await?;
        self.progress
            .success(STAGE, format!("Updated PR #{}", record.number));

        Ok(PrOutcome::Updated(PullRequestRecord {
            title: update.updated_title,
            ..record
        }))
    }

    async fn draft_update(
        &self,
        upstream: &UpstreamBranch,
        record: &PullRequestRecord,
        pending: Vec<Commit>,
    ) -> Result<DescriptionUpdate, StageError> {
        let current = match self.host.view_pr(record.number).await {
            Ok(content) => Some(content),
            Err(e) => {
                self.progress.warning(
                    STAGE,
                    format!("Could not fetch the current description ({e}); regenerating without it"),
                );
                None
            }
        };

        let new_commits = if pending.is_empty() {
            // History was rewritten in this run; describe the latest commit.
            self.git
                .log(&format!("{upstream}..HEAD"))
                .await?
                .into_iter()
                .take(1)
                .collect()
        } else {
            pending
        };

        let latest_diff = DiffCollector::new(self.git, self.ignore)
            .single_commit_diff("HEAD")
            .await?;

        self.model
            .ask(&update_prompt(current.as_ref(), &new_commits, &latest_diff))
            .await
    }

    async fn create_new(
        &self,
        upstream: &UpstreamBranch,
        current: &str,
        draft: bool,
        host_ready: bool,
        session: &WorkflowSession,
    ) -> Result<PrOutcome, StageError> {
        let local_branches = self.git.local_branches().await?;
        let diff = DiffCollector::new(self.git, self.ignore)
            .range_diff(&upstream.to_string(), "HEAD")
            .await?;
        if diff.is_empty() {
            self.progress.warning(
                STAGE,
                format!("No reviewable changes between {upstream} and HEAD; nothing to open a PR for"),
            );
            return Ok(PrOutcome::Skipped(PrSkip::NoChanges));
        }
        let commits = self.git.log(&format!("{upstream}..HEAD")).await?;

        let proposal: PullRequestProposal = self
            .model
            .ask(&proposal_prompt(&diff, &commits, upstream, &local_branches))
            .await?;

        let on_target = current == upstream.branch;
        let head = if on_target {
            unique_branch_name(&proposal.suggested_branch_name, &local_branches)
        } else {
            current.to_string()
        };

        self.progress.info(
            STAGE,
            format!(
                "Branch: {head}\nTitle: {}\n\n{}",
                proposal.pr_title, proposal.pr_description
            ),
        );

        let prompt = if on_target {
            format!("Create branch '{head}', push it and open a PR into '{}'?", upstream.branch)
        } else {
            format!("Push '{head}' and open a PR into '{}'?", upstream.branch)
        };
        if let Answer::Declined(_) = ask(self.confirm, Gate::CreatePullRequest, &prompt)? {
            self.progress.warning(STAGE, "Pull request creation skipped");
            return Ok(PrOutcome::Skipped(PrSkip::CreateDeclined));
        }

        if on_target {
            self.git.checkout_new_branch(&head).await?;
            self.progress
                .success(STAGE, format!("Created branch {head}"));
        }
        self.git
            .push(&upstream.remote, &head, rewrite_mode(session, PushMode::SetUpstream))
            .await?;
        self.progress
            .success(STAGE, format!("Pushed {head} to {}", upstream.remote));

        if !host_ready {
            return Ok(PrOutcome::Manual(ManualInstructions {
                title: proposal.pr_title,
                description: proposal.pr_description,
                from: head,
                to: upstream.branch.clone(),
            }));
        }

        let record = self
            .host
            .create_pr(&NewPullRequest {
                title: proposal.pr_title,
                body: proposal.pr_description,
                base: upstream.branch.clone(),
                head,
                draft,
            })
            .await?;
        self.progress
            .success(STAGE, format!("Opened PR #{}: {}", record.number, record.url));

        Ok(PrOutcome::Created(record))
    }
}
