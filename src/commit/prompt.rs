//! Prompt construction for drafting and reviewing commit messages.

use crate::commit::diff::CollectedDiff;
use crate::git::Commit;
use crate::llm::prompt::diff_section;

const SUBJECT_RULES: &str = r#"## Subject Line Rules (STRICT)
- Format: `type(scope): description`
- Type: one of feat, fix, build, chore, ci, docs, style, refactor, perf, test
- Scope: the primary module affected, named by the user-facing concept rather than the file
- Description: imperative mood ("add", "fix", "remove"), lowercase after the colon, no trailing period
- HARD LIMIT: the whole subject line must be 72 characters or fewer

GOOD: `fix(parser): handle empty input`
BAD:  `Fixed a bug where the parser crashed when it received an empty input string.`

## Body Rules
The diff already shows WHAT changed; the body explains WHY.
- Separate the body from the subject with one blank line
- Wrap lines at 72 characters
- Omit the body for trivial changes (typos, formatting)
- If the branch name contains an issue key (e.g. `feat/ABC-42`), end with `Refs ABC-42`"#;

fn file_list(files: &[String]) -> String {
    files
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask for a message describing uncommitted changes.
pub fn draft_prompt(diff: &CollectedDiff, branch: &str) -> String {
    format!(
        r#"Write a Git commit message for the following uncommitted changes, following the Conventional Commits specification.

## Changed Files ({count})
{files}

{diff}

## Branch
{branch}

{SUBJECT_RULES}

## Output Format
Respond with ONLY this JSON object:
{{"commitMessage": "type(scope): subject\n\noptional body"}}"#,
        count = diff.files.len(),
        files = file_list(&diff.files),
        diff = diff_section("Diff", &diff.text),
    )
}

/// Ask whether the latest commit's message describes its changes well.
pub fn review_prompt(
    commit: &Commit,
    commit_diff: &CollectedDiff,
    branch_diff: &CollectedDiff,
) -> String {
    format!(
        r#"Review the message of the most recent commit on this branch and decide whether it should be rewritten.

## Current Commit Message
```
{message}
```

{commit_diff}

{branch_diff}

## Review Criteria
A message needs improvement when it is vague ("wip", "fix stuff", "updates"), does not follow Conventional Commits, misdescribes the change, or omits the reason for a non-obvious change.
A message that is already accurate and well-formed must be left alone; do not rewrite for style alone.
Use the branch diff only as context for what the branch is about; describe only this commit's changes.

{SUBJECT_RULES}

## Output Format
Respond with ONLY this JSON object:
{{"needsImprovement": true or false, "reason": "one sentence explaining the decision", "improvedCommitMessage": "full replacement message, only when needsImprovement is true"}}"#,
        message = commit.message.trim(),
        commit_diff = diff_section("Changes In This Commit", &commit_diff.text),
        branch_diff = diff_section("All Changes On This Branch", &branch_diff.text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(files: &[&str], text: &str) -> CollectedDiff {
        CollectedDiff {
            text: text.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_draft_prompt_lists_files_and_branch() {
        let diff = collected(&["src/auth/login.ts", "src/auth/session.ts"], "+login()\n");
        let prompt = draft_prompt(&diff, "feat/ABC-42-login");

        assert!(prompt.contains("## Changed Files (2)"));
        assert!(prompt.contains("- src/auth/login.ts"));
        assert!(prompt.contains("feat/ABC-42-login"));
        assert!(prompt.contains("+login()"));
    }

    #[test]
    fn test_draft_prompt_requests_commit_message_json() {
        let prompt = draft_prompt(&collected(&["a.ts"], "+x\n"), "main");
        assert!(prompt.contains(r#""commitMessage""#));
        assert!(prompt.contains("HARD LIMIT"));
    }

    #[test]
    fn test_draft_prompt_notes_truncation() {
        let big = "+line\n".repeat(10_000);
        let prompt = draft_prompt(&collected(&["big.ts"], &big), "main");
        assert!(prompt.contains("truncated due to size"));
    }

    #[test]
    fn test_review_prompt_includes_message_and_both_diffs() {
        let commit = Commit {
            hash: "abc".to_string(),
            message: "wip\n".to_string(),
            parents: vec!["p".to_string()],
        };
        let prompt = review_prompt(
            &commit,
            &collected(&["a.ts"], "+only this commit\n"),
            &collected(&["a.ts", "b.ts"], "+whole branch\n"),
        );

        assert!(prompt.contains("```\nwip\n```"));
        assert!(prompt.contains("## Changes In This Commit"));
        assert!(prompt.contains("+only this commit"));
        assert!(prompt.contains("## All Changes On This Branch"));
        assert!(prompt.contains("+whole branch"));
        assert!(prompt.contains(r#""needsImprovement""#));
        assert!(prompt.contains(r#""improvedCommitMessage""#));
    }
}
