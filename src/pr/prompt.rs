//! Prompt construction for pull-request proposals and description updates.

use crate::commit::diff::CollectedDiff;
use crate::git::{Commit, UpstreamBranch};
use crate::github::PullRequestContent;
use crate::llm::prompt::diff_section;
use crate::llm::schema::{MAX_BRANCH_CHARS, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};

/// Commits rendered one per line as `<short hash> <subject>`.
fn commit_list(commits: &[Commit]) -> String {
    if commits.is_empty() {
        return "(none)".to_string();
    }
    commits
        .iter()
        .map(|c| format!("- {} {}", c.short_hash(), c.summary()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn description_rules() -> String {
    format!(
        r#"## Description Rules
- Start with a one-paragraph summary of what the change does and why
- Follow with a short bullet list of the notable changes
- Mention anything reviewers should test or watch out for
- Markdown is allowed; keep it under {MAX_DESCRIPTION_CHARS} characters
- Title: imperative mood, no trailing period, at most {MAX_TITLE_CHARS} characters"#
    )
}

/// Ask for a branch name, title and description for a new pull request.
pub fn proposal_prompt(
    diff: &CollectedDiff,
    commits: &[Commit],
    upstream: &UpstreamBranch,
    local_branches: &[String],
) -> String {
    let taken = if local_branches.is_empty() {
        "(none)".to_string()
    } else {
        local_branches.join(", ")
    };

    format!(
        r#"Propose a pull request for the following changes, which will be merged into `{target}`.

## Commits
{commits}

{diff}

## Branch Name Rules
- Lowercase letters, digits and hyphens, optionally one `/` after a type prefix (e.g. `feat/add-login`)
- At most {MAX_BRANCH_CHARS} characters
- Must not be one of the existing local branches: {taken}

{rules}

## Output Format
Respond with ONLY this JSON object:
{{"suggestedBranchName": "feat/short-name", "prTitle": "Title", "prDescription": "Markdown description"}}"#,
        target = upstream.branch,
        commits = commit_list(commits),
        diff = diff_section("Diff", &diff.text),
        rules = description_rules(),
    )
}

/// Ask for a refreshed title and description for an open pull request.
pub fn update_prompt(
    current: Option<&PullRequestContent>,
    new_commits: &[Commit],
    latest_diff: &CollectedDiff,
) -> String {
    let current_section = match current {
        Some(content) => format!(
            "## Current Title\n{}\n\n## Current Description\n{}",
            content.title.trim(),
            if content.body.trim().is_empty() {
                "(empty)"
            } else {
                content.body.trim()
            }
        ),
        None => "## Current Title and Description\n(unavailable; write them from scratch)"
            .to_string(),
    };

    format!(
        r#"An open pull request received new commits. Update its title and description so they describe the pull request as a whole, including the new work.

{current_section}

## New Commits
{commits}

{diff}

Keep whatever in the current description is still accurate; revise what the new commits changed.

{rules}

## Output Format
Respond with ONLY this JSON object:
{{"updatedTitle": "Title", "updatedDescription": "Markdown description"}}"#,
        commits = commit_list(new_commits),
        diff = diff_section("Latest Commit Diff", &latest_diff.text),
        rules = description_rules(),
    )
}
