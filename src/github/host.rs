//! The pull-request host surface the workflow consumes.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::HostError;

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    pub number: u64,
    pub url: String,
    pub title: String,
    pub head_ref_name: String,
    pub base_ref_name: String,
    #[serde(default)]
    pub is_draft: bool,
}

/// Title and body of an existing pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestContent {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Branch the PR merges into.
    pub base: String,
    /// Branch carrying the changes.
    pub head: String,
    pub draft: bool,
}

/// Fields to change on an existing pull request; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestEdit {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteHost: Send + Sync {
    async fn is_installed(&self) -> bool;

    async fn is_authenticated(&self) -> bool;

    /// The open pull request whose head is `branch`, if any.
    async fn find_open_pr(&self, branch: &str) -> Result<Option<PullRequestRecord>, HostError>;

    async fn view_pr(&self, number: u64) -> Result<PullRequestContent, HostError>;

    /// Open a pull request and return its record.
    async fn create_pr(&self, request: &NewPullRequest) -> Result<PullRequestRecord, HostError>;

    async fn edit_pr(&self, number: u64, edit: &PullRequestEdit) -> Result<(), HostError>;
}

/// PR number from a URL such as `https://github.com/o/r/pull/42`.
pub fn pr_number_from_url(url: &str) -> Option<u64> {
    let mut segments = url.trim().trim_end_matches('/').rsplit('/');
    let number = segments.next()?.parse().ok()?;
    (segments.next()? == "pull").then_some(number)
}
