//! Pull-request host operations through the GitHub CLI.

pub mod gh;
pub mod host;

pub use gh::GhCli;
pub use host::{
    NewPullRequest, PullRequestContent, PullRequestEdit, PullRequestRecord, RemoteHost,
    pr_number_from_url,
};
