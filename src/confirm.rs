//! Yes/no and pick-one interaction, either interactive or auto-affirmed.
//!
//! Every confirmation point in the workflow is a named [`Gate`] with an
//! explicit [`DeclinePolicy`], so whether a "no" skips a step or ends the run
//! is visible in one table instead of scattered through the stages.

use std::io;

use dialoguer::{Confirm, Select};

/// Named confirmation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// "Use the tracking branch as the PR target?"
    UseTrackingBranch,
    /// Second confirmation after picking a remote branch from the list.
    ConfirmSelectedBranch,
    /// Commit the uncommitted changes with the drafted message.
    CommitChanges,
    /// Amend the last commit with the improved message.
    AmendCommit,
    /// Push new commits to the branch of an already-open PR.
    PushToExistingPr,
    /// Ask the model for a fresh title/description for the open PR.
    RegenerateDescription,
    /// Apply the regenerated title/description to the open PR.
    ApplyDescription,
    /// Create the branch, push and open a new PR.
    CreatePullRequest,
}

/// What a "no" at a gate means for the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclinePolicy {
    /// Continue with the alternative path inside the same step.
    FallThrough,
    /// Abandon the current step; the workflow moves on to the next stage.
    SkipStep,
    /// Abandon the whole run.
    CancelRun,
}

impl Gate {
    pub fn on_decline(self) -> DeclinePolicy {
        match self {
            Gate::UseTrackingBranch => DeclinePolicy::FallThrough,
            Gate::ConfirmSelectedBranch => DeclinePolicy::CancelRun,
            Gate::CommitChanges
            | Gate::AmendCommit
            | Gate::PushToExistingPr
            | Gate::RegenerateDescription
            | Gate::ApplyDescription
            | Gate::CreatePullRequest => DeclinePolicy::SkipStep,
        }
    }
}

/// Outcome of asking at a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Accepted,
    Declined(DeclinePolicy),
}

/// User interaction surface consumed by the workflow.
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, gate: Gate, prompt: &str) -> io::Result<bool>;

    /// Pick one of `items`; returns the chosen index.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> io::Result<usize>;
}

/// Ask at `gate` and translate the reply through the gate's decline policy.
pub fn ask(confirm: &dyn ConfirmationGate, gate: Gate, prompt: &str) -> io::Result<Answer> {
    if confirm.confirm(gate, prompt)? {
        Ok(Answer::Accepted)
    } else {
        Ok(Answer::Declined(gate.on_decline()))
    }
}

/// Terminal prompts via dialoguer.
pub struct DialoguerGate;

impl ConfirmationGate for DialoguerGate {
    fn confirm(&self, _gate: Gate, prompt: &str) -> io::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> io::Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Says yes to everything and takes the default selection (`--yes`).
pub struct AutoConfirm;

impl ConfirmationGate for AutoConfirm {
    fn confirm(&self, _gate: Gate, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }

    fn select(&self, _prompt: &str, items: &[String], default: usize) -> io::Result<usize> {
        if items.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "nothing to select",
            ));
        }
        Ok(default.min(items.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_only_branch_confirmation_cancels_run() {
        let cancelling: Vec<Gate> = [
            Gate::UseTrackingBranch,
            Gate::ConfirmSelectedBranch,
            Gate::CommitChanges,
            Gate::AmendCommit,
            Gate::PushToExistingPr,
            Gate::RegenerateDescription,
            Gate::ApplyDescription,
            Gate::CreatePullRequest,
        ]
        .into_iter()
        .filter(|g| g.on_decline() == DeclinePolicy::CancelRun)
        .collect();

        assert_eq!(cancelling, vec![Gate::ConfirmSelectedBranch]);
    }

    #[test]
    fn test_tracking_branch_decline_falls_through() {
        assert_eq!(
            Gate::UseTrackingBranch.on_decline(),
            DeclinePolicy::FallThrough
        );
    }

    #[test]
    fn test_ask_maps_decline_through_policy() {
        let mut mock = MockConfirmationGate::new();
        mock.expect_confirm()
            .with(eq(Gate::AmendCommit), eq("Amend?"))
            .times(1)
            .returning(|_, _| Ok(false));

        let answer = ask(&mock, Gate::AmendCommit, "Amend?").unwrap();
        assert_eq!(answer, Answer::Declined(DeclinePolicy::SkipStep));
    }

    #[test]
    fn test_ask_accepts() {
        let mut mock = MockConfirmationGate::new();
        mock.expect_confirm().returning(|_, _| Ok(true));
        assert_eq!(
            ask(&mock, Gate::CreatePullRequest, "Create?").unwrap(),
            Answer::Accepted
        );
    }

    #[test]
    fn test_auto_confirm_takes_default_selection() {
        let items = vec!["origin/dev".to_string(), "origin/main".to_string()];
        assert!(AutoConfirm.confirm(Gate::CreatePullRequest, "?").unwrap());
        assert_eq!(AutoConfirm.select("?", &items, 1).unwrap(), 1);
        assert_eq!(AutoConfirm.select("?", &items, 9).unwrap(), 1);
        assert!(AutoConfirm.select("?", &[], 0).is_err());
    }
}
