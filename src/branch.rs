//! Choosing the branch the pull request targets.

use tracing::debug;

use crate::confirm::{Answer, ConfirmationGate, Gate, ask};
use crate::error::{BranchError, StageError};
use crate::git::{UpstreamBranch, VersionControl};
use crate::progress::{ProgressExt, ProgressSink, Stage};

const STAGE: Stage = Stage::BranchResolution;

/// Result of resolving the upstream branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(UpstreamBranch),
    /// The user declined the selected branch; the run ends here.
    Cancelled,
}

/// Drop symbolic pointer entries such as `origin/HEAD` or `origin/HEAD -> origin/main`.
pub fn selectable_branches(remote_branches: &[String]) -> Vec<String> {
    remote_branches
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty() && !b.contains("->") && !b.ends_with("/HEAD"))
        .map(str::to_string)
        .collect()
}

/// Preselected entry: `<remote>/main`, then `<remote>/master`, else the first.
pub fn default_index(branches: &[String]) -> usize {
    ["main", "master"]
        .iter()
        .find_map(|name| {
            branches.iter().position(|b| {
                UpstreamBranch::parse(b).is_some_and(|u| u.branch == *name)
            })
        })
        .unwrap_or(0)
}

pub struct BranchResolver<'a> {
    git: &'a dyn VersionControl,
    confirm: &'a dyn ConfirmationGate,
    progress: &'a dyn ProgressSink,
}

impl<'a> BranchResolver<'a> {
    pub fn new(
        git: &'a dyn VersionControl,
        confirm: &'a dyn ConfirmationGate,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            git,
            confirm,
            progress,
        }
    }

    pub async fn resolve(&self) -> Result<Resolution, StageError> {
        let current = self
            .git
            .current_branch()
            .await
            .map_err(BranchError::NoTrackingInfo)?;
        let tracking = self
            .git
            .tracking_branch(&current)
            .await
            .map_err(BranchError::NoTrackingInfo)?;
        debug!(current = %current, ?tracking, "resolving upstream");

        if let Some(upstream) = tracking.as_deref().and_then(UpstreamBranch::parse) {
            let prompt = format!("Use tracking branch '{upstream}' as the PR target?");
            match ask(self.confirm, Gate::UseTrackingBranch, &prompt)? {
                Answer::Accepted => {
                    self.progress
                        .success(STAGE, format!("Using tracking branch {upstream}"));
                    return Ok(Resolution::Selected(upstream));
                }
                Answer::Declined(_) => {
                    self.progress
                        .info(STAGE, "Choose the target branch from the remote branches");
                }
            }
        } else {
            self.progress
                .info(STAGE, format!("'{current}' has no tracking branch"));
        }

        self.select_remote_branch().await
    }

    async fn select_remote_branch(&self) -> Result<Resolution, StageError> {
        let remote = self
            .git
            .remote_branches()
            .await
            .map_err(BranchError::ListFailed)?;
        let branches = selectable_branches(&remote);
        if branches.is_empty() {
            return Err(BranchError::NoRemoteBranches.into());
        }

        let index = self
            .confirm
            .select("Select the target branch", &branches, default_index(&branches))?;
        let chosen = branches
            .get(index)
            .and_then(|b| UpstreamBranch::parse(b))
            .ok_or(BranchError::NoRemoteBranches)?;

        let prompt = format!("Create or update the pull request against '{chosen}'?");
        match ask(self.confirm, Gate::ConfirmSelectedBranch, &prompt)? {
            Answer::Accepted => {
                self.progress
                    .success(STAGE, format!("Using target branch {chosen}"));
                Ok(Resolution::Selected(chosen))
            }
            Answer::Declined(_) => {
                self.progress.warning(STAGE, "Cancelled");
                Ok(Resolution::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockConfirmationGate;
    use crate::error::GitError;
    use crate::git::MockVersionControl;
    use crate::progress::TracingProgress;
    use mockall::predicate::eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selectable_branches_drops_head_pointers() {
        let raw = names(&[
            "origin/HEAD -> origin/main",
            "origin/HEAD",
            "origin/main",
            "origin/feature/x",
        ]);
        assert_eq!(
            selectable_branches(&raw),
            names(&["origin/main", "origin/feature/x"])
        );
    }

    #[test]
    fn test_default_index_prefers_main_then_master() {
        assert_eq!(
            default_index(&names(&["origin/dev", "origin/master", "origin/main"])),
            2
        );
        assert_eq!(default_index(&names(&["origin/dev", "origin/master"])), 1);
        assert_eq!(default_index(&names(&["origin/dev", "origin/release"])), 0);
    }

    #[tokio::test]
    async fn test_accepted_tracking_branch() {
        let mut git = MockVersionControl::new();
        git.expect_current_branch()
            .returning(|| Ok("feature".to_string()));
        git.expect_tracking_branch()
            .with(eq("feature"))
            .returning(|_| Ok(Some("origin/develop".to_string())));
        git.expect_remote_branches().times(0);

        let mut confirm = MockConfirmationGate::new();
        confirm
            .expect_confirm()
            .with(eq(Gate::UseTrackingBranch), mockall::predicate::always())
            .returning(|_, _| Ok(true));

        let resolution = BranchResolver::new(&git, &confirm, &TracingProgress)
            .resolve()
            .await
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Selected(UpstreamBranch::parse("origin/develop").unwrap())
        );
    }

    #[tokio::test]
    async fn test_declined_tracking_falls_through_to_selection() {
        let mut git = MockVersionControl::new();
        git.expect_current_branch()
            .returning(|| Ok("feature".to_string()));
        git.expect_tracking_branch()
            .returning(|_| Ok(Some("origin/feature".to_string())));
        git.expect_remote_branches().returning(|| {
            Ok(vec![
                "origin/HEAD".to_string(),
                "origin/feature".to_string(),
                "origin/main".to_string(),
            ])
        });

        let mut confirm = MockConfirmationGate::new();
        confirm
            .expect_confirm()
            .with(eq(Gate::UseTrackingBranch), mockall::predicate::always())
            .returning(|_, _| Ok(false));
        confirm
            .expect_select()
            .withf(|_, items, default| items.len() == 2 && *default == 1)
            .returning(|_, _, default| Ok(default));
        confirm
            .expect_confirm()
            .with(eq(Gate::ConfirmSelectedBranch), mockall::predicate::always())
            .returning(|_, _| Ok(true));

        let resolution = BranchResolver::new(&git, &confirm, &TracingProgress)
            .resolve()
            .await
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Selected(UpstreamBranch::parse("origin/main").unwrap())
        );
    }

    #[tokio::test]
    async fn test_declined_selection_cancels_run() {
        let mut git = MockVersionControl::new();
        git.expect_current_branch()
            .returning(|| Ok("feature".to_string()));
        git.expect_tracking_branch().returning(|_| Ok(None));
        git.expect_remote_branches()
            .returning(|| Ok(vec!["origin/main".to_string()]));

        let mut confirm = MockConfirmationGate::new();
        confirm.expect_select().returning(|_, _, _| Ok(0));
        confirm
            .expect_confirm()
            .with(eq(Gate::ConfirmSelectedBranch), mockall::predicate::always())
            .returning(|_, _| Ok(false));

        let resolution = BranchResolver::new(&git, &confirm, &TracingProgress)
            .resolve()
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Cancelled);
    }

    #[tokio::test]
    async fn test_no_remote_branches_is_an_error() {
        let mut git = MockVersionControl::new();
        git.expect_current_branch()
            .returning(|| Ok("main".to_string()));
        git.expect_tracking_branch().returning(|_| Ok(None));
        git.expect_remote_branches()
            .returning(|| Ok(vec!["origin/HEAD".to_string()]));

        let confirm = MockConfirmationGate::new();
        let err = BranchResolver::new(&git, &confirm, &TracingProgress)
            .resolve()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Branch(BranchError::NoRemoteBranches)
        ));
    }

    #[tokio::test]
    async fn test_unreadable_branch_metadata() {
        let mut git = MockVersionControl::new();
        git.expect_current_branch()
            .returning(|| Err(GitError::DetachedHead));

        let confirm = MockConfirmationGate::new();
        let err = BranchResolver::new(&git, &confirm, &TracingProgress)
            .resolve()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Branch(BranchError::NoTrackingInfo(GitError::DetachedHead))
        ));
    }
}
