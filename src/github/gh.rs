//! [`RemoteHost`] backed by the GitHub CLI (`gh`).

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::host::{
    NewPullRequest, PullRequestContent, PullRequestEdit, PullRequestRecord, RemoteHost,
    pr_number_from_url,
};
use crate::error::HostError;

const PR_FIELDS: &str = "number,url,title,headRefName,baseRefName,isDraft";

/// `gh` run from inside the repository work tree.
#[derive(Debug, Clone)]
pub struct GhCli {
    workdir: PathBuf,
}

impl GhCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn run_gh(&self, args: &[&str], operation: &str) -> Result<String, HostError> {
        debug!(operation, "running gh");
        let output = Command::new("gh")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| HostError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(HostError::CommandFailed {
                operation: operation.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn succeeds(&self, args: &[&str]) -> bool {
        Command::new("gh")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(
    stdout: &str,
    operation: &str,
) -> Result<T, HostError> {
    serde_json::from_str(stdout.trim()).map_err(|e| HostError::UnexpectedOutput {
        operation: operation.to_string(),
        detail: e.to_string(),
    })
}

#[async_trait]
impl RemoteHost for GhCli {
    async fn is_installed(&self) -> bool {
        which::which("gh").is_ok()
    }

    async fn is_authenticated(&self) -> bool {
        self.succeeds(&["auth", "status"]).await
    }

    async fn find_open_pr(&self, branch: &str) -> Result<Option<PullRequestRecord>, HostError> {
        let operation = "pr list";
        let stdout = self
            .run_gh(
                &[
                    "pr", "list", "--head", branch, "--state", "open", "--json", PR_FIELDS,
                    "--limit", "1",
                ],
                operation,
            )
            .await?;
        let records: Vec<PullRequestRecord> = parse_json(&stdout, operation)?;
        Ok(records.into_iter().next())
    }

    async fn view_pr(&self, number: u64) -> Result<PullRequestContent, HostError> {
        let operation = "pr view";
        let number = number.to_string();
        let stdout = self
            .run_gh(&["pr", "view", &number, "--json", "title,body"], operation)
            .await?;
        parse_json(&stdout, operation)
    }

    async fn create_pr(&self, request: &NewPullRequest) -> Result<PullRequestRecord, HostError> {
        let mut args = vec![
            "pr",
            "create",
            "--title",
            request.title.as_str(),
            "--body",
            request.body.as_str(),
            "--base",
            request.base.as_str(),
            "--head",
            request.head.as_str(),
        ];
        if request.draft {
            args.push("--draft");
        }
        let stdout = self.run_gh(&args, "pr create").await?;

        // gh prints the new PR's URL as the last line.
        let url = stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
        let number = match pr_number_from_url(url) {
            Some(number) => number,
            None => match self.find_open_pr(&request.head).await? {
                Some(record) => return Ok(record),
                None => {
                    return Err(HostError::UnexpectedOutput {
                        operation: "pr create".to_string(),
                        detail: format!("no pull request URL in output: {}", stdout.trim()),
                    });
                }
            },
        };

        Ok(PullRequestRecord {
            number,
            url: url.to_string(),
            title: request.title.clone(),
            head_ref_name: request.head.clone(),
            base_ref_name: request.base.clone(),
            is_draft: request.draft,
        })
    }

    async fn edit_pr(&self, number: u64, edit: &PullRequestEdit) -> Result<(), HostError> {
        let number = number.to_string();
        let mut args = vec!["pr", "edit", number.as_str()];
        if let Some(title) = edit.title.as_deref() {
            args.extend(["--title", title]);
        }
        if let Some(body) = edit.body.as_deref() {
            args.extend(["--body", body]);
        }
        if args.len() == 3 {
            return Ok(());
        }
        self.run_gh(&args, "pr edit").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reports_operation() {
        let err = parse_json::<Vec<PullRequestRecord>>("not json", "pr list").unwrap_err();
        assert!(err.to_string().starts_with("Could not parse gh pr list output"));
    }

    #[test]
    fn test_parse_empty_list() {
        let records: Vec<PullRequestRecord> = parse_json("[]\n", "pr list").unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_empty_edit_is_a_no_op() {
        // No gh invocation happens when there is nothing to change.
        let gh = GhCli::new("/nonexistent");
        gh.edit_pr(1, &PullRequestEdit::default()).await.unwrap();
    }
}
