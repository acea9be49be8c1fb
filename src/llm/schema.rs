//! Response shapes the model is asked for, with strict validation.
//!
//! Field names are camelCase on the wire. A reply that is not valid JSON,
//! misses a required field, has a field of the wrong type, or breaks a
//! length/format constraint is a [`ResponseFormatError`].

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::json::extract_json;
use crate::error::ResponseFormatError;

/// Longest PR title accepted.
pub const MAX_TITLE_CHARS: usize = 100;
/// Longest PR description accepted.
pub const MAX_DESCRIPTION_CHARS: usize = 2_000;
/// Longest suggested branch name accepted.
pub const MAX_BRANCH_CHARS: usize = 50;

static BRANCH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[-/][a-z0-9]+)*$").expect("valid branch-name regex")
});

/// A JSON shape returned by the model.
pub trait ResponseSchema: DeserializeOwned {
    const NAME: &'static str;

    /// Constraints beyond what deserialization checks.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Extract, deserialize and validate a model reply.
pub fn parse_response<T: ResponseSchema>(raw: &str) -> Result<T, ResponseFormatError> {
    let candidate = extract_json(raw).unwrap_or_else(|| raw.trim());
    let parsed: T =
        serde_json::from_str(candidate).map_err(|source| ResponseFormatError::InvalidJson {
            schema: T::NAME,
            source,
            excerpt: excerpt(raw),
        })?;
    parsed
        .validate()
        .map_err(|reason| ResponseFormatError::Invalid {
            schema: T::NAME,
            reason,
        })?;
    Ok(parsed)
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn require_text(field: &str, value: &str, max_chars: Option<usize>) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is empty"));
    }
    if let Some(max) = max_chars {
        let len = value.chars().count();
        if len > max {
            return Err(format!("{field} is {len} characters (max {max})"));
        }
    }
    Ok(())
}

/// `{"commitMessage": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMessageDraft {
    pub commit_message: String,
}

impl ResponseSchema for CommitMessageDraft {
    const NAME: &'static str = "commit message";

    fn validate(&self) -> Result<(), String> {
        require_text("commitMessage", &self.commit_message, None)
    }
}

/// `{"needsImprovement": bool, "reason": "...", "improvedCommitMessage": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReview {
    pub needs_improvement: bool,
    pub reason: String,
    #[serde(default)]
    pub improved_commit_message: Option<String>,
}

impl CommitReview {
    /// The replacement message, when one is both requested and present.
    pub fn improved_message(&self) -> Option<&str> {
        self.improved_commit_message
            .as_deref()
            .map(str::trim)
            .filter(|m| self.needs_improvement && !m.is_empty())
    }
}

impl ResponseSchema for CommitReview {
    const NAME: &'static str = "commit review";

    fn validate(&self) -> Result<(), String> {
        if self.needs_improvement && self.improved_message().is_none() {
            return Err("needsImprovement is true but improvedCommitMessage is missing".to_string());
        }
        Ok(())
    }
}

/// `{"suggestedBranchName": "...", "prTitle": "...", "prDescription": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestProposal {
    pub suggested_branch_name: String,
    pub pr_title: String,
    pub pr_description: String,
}

impl ResponseSchema for PullRequestProposal {
    const NAME: &'static str = "pull request proposal";

    fn validate(&self) -> Result<(), String> {
        let branch = &self.suggested_branch_name;
        if branch.chars().count() > MAX_BRANCH_CHARS {
            return Err(format!(
                "suggestedBranchName is longer than {MAX_BRANCH_CHARS} characters"
            ));
        }
        if !BRANCH_NAME.is_match(branch) {
            return Err(format!(
                "suggestedBranchName '{branch}' must be lowercase words joined by hyphens"
            ));
        }
        require_text("prTitle", &self.pr_title, Some(MAX_TITLE_CHARS))?;
        require_text(
            "prDescription",
            &self.pr_description,
            Some(MAX_DESCRIPTION_CHARS),
        )
    }
}

/// `{"updatedTitle": "...", "updatedDescription": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionUpdate {
    pub updated_title: String,
    pub updated_description: String,
}

impl ResponseSchema for DescriptionUpdate {
    const NAME: &'static str = "description update";

    fn validate(&self) -> Result<(), String> {
        require_text("updatedTitle", &self.updated_title, Some(MAX_TITLE_CHARS))?;
        require_text(
            "updatedDescription",
            &self.updated_description,
            Some(MAX_DESCRIPTION_CHARS),
        )
    }
}
