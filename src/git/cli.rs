//! [`VersionControl`] backed by git2 for reads and the `git` binary for writes.
//!
//! Anything that creates objects or talks to a remote shells out to the system
//! `git`, inheriting the user's config, hooks, SSH agent and credential store.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use git2::{BranchType, ErrorCode, Repository, StatusOptions};
use tokio::process::Command;
use tracing::debug;

use super::{Commit, PushMode, VersionControl, WorkingTreeStatus};
use crate::error::GitError;

/// A repository on disk.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Discover the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(GitError::OpenRepository)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| {
                GitError::OpenRepository(git2::Error::from_str("bare repositories are not supported"))
            })?
            .to_path_buf();
        Ok(Self { workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn open(&self) -> Result<Repository, GitError> {
        Repository::open(&self.workdir).map_err(GitError::OpenRepository)
    }

    /// `git <args>` in the work tree with untranslated messages, so stderr
    /// can be matched regardless of the user's locale.
    fn git_command(&self, args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .stdin(Stdio::null());
        command
    }

    /// Run `git <args>` in the work tree and return stdout.
    async fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        self.run_git_accepting(args, operation, &[0]).await
    }

    /// Like [`Self::run_git`], treating every exit code in `accepted` as success.
    async fn run_git_accepting(
        &self,
        args: &[&str],
        operation: &str,
        accepted: &[i32],
    ) -> Result<String, GitError> {
        debug!(operation, ?args, "running git");
        let output = self
            .git_command(args)
            .output()
            .await
            .map_err(|source| GitError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })?;

        if !output.status.code().is_some_and(|code| accepted.contains(&code)) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::CommandFailed {
                operation: operation.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn head_hash(&self) -> Result<String, GitError> {
        self.rev_parse("HEAD").await
    }

    fn read_status(&self) -> Result<WorkingTreeStatus, GitError> {
        let repo = self.open()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = repo.statuses(Some(&mut opts)).map_err(GitError::Repository)?;
        let mut status = WorkingTreeStatus::default();

        for entry in statuses.iter() {
            let flags = entry.status();

            if flags.is_index_renamed() {
                // entry.path() is the pre-rename side.
                let paths = entry.head_to_index().and_then(|delta| {
                    let old = delta.old_file().path()?.to_str()?.to_string();
                    let new = delta.new_file().path()?.to_str()?.to_string();
                    Some((old, new))
                });
                if let Some((old, new)) = paths {
                    status.renamed.insert(new.clone());
                    status.renamed_from.insert(new, old);
                }
                continue;
            }

            let Some(path) = entry.path() else {
                continue;
            };
            let path = path.to_string();

            if flags.is_index_new() || flags.is_wt_new() {
                status.added.insert(path);
            } else if flags.is_index_deleted() || flags.is_wt_deleted() {
                status.deleted.insert(path);
            } else if flags.is_index_modified()
                || flags.is_wt_modified()
                || flags.is_index_typechange()
                || flags.is_wt_typechange()
            {
                status.modified.insert(path);
            }
        }

        Ok(status)
    }

    fn is_untracked(&self, path: &str) -> Result<bool, GitError> {
        let repo = self.open()?;
        match repo.status_file(Path::new(path)) {
            Ok(status) => Ok(status.is_wt_new()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(GitError::Repository(e)),
        }
    }

    /// Whole-file diff of an untracked path; `--no-index` exits 1 when files differ.
    async fn diff_untracked(&self, path: &str) -> Result<String, GitError> {
        self.run_git_accepting(
            &["diff", "--no-color", "--no-index", "--", "/dev/null", path],
            "diff --no-index",
            &[0, 1],
        )
        .await
    }
}

fn exclude_args<'a>(exclude: &'a [String]) -> impl Iterator<Item = &'a str> {
    // A positive pathspec is needed alongside the excludes.
    std::iter::once(".").chain(exclude.iter().map(String::as_str))
}

#[async_trait]
impl VersionControl for GitCli {
    async fn status(&self) -> Result<WorkingTreeStatus, GitError> {
        self.read_status()
    }

    async fn current_branch(&self) -> Result<String, GitError> {
        let repo = self.open()?;
        if repo.head_detached().map_err(GitError::Repository)? {
            return Err(GitError::DetachedHead);
        }
        let head = repo
            .head()
            .map_err(|e| GitError::ReferenceNotFound("HEAD".to_string(), e))?;
        head.shorthand()
            .map(str::to_string)
            .ok_or(GitError::DetachedHead)
    }

    async fn tracking_branch(&self, branch: &str) -> Result<Option<String>, GitError> {
        let repo = self.open()?;
        let local = repo
            .find_branch(branch, BranchType::Local)
            .map_err(|e| GitError::ReferenceNotFound(branch.to_string(), e))?;

        match local.upstream() {
            Ok(upstream) => Ok(upstream
                .name()
                .map_err(GitError::Repository)?
                .map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Repository(e)),
        }
    }

    async fn local_branches(&self) -> Result<Vec<String>, GitError> {
        branch_names(&self.open()?, BranchType::Local)
    }

    async fn remote_branches(&self) -> Result<Vec<String>, GitError> {
        branch_names(&self.open()?, BranchType::Remote)
    }

    async fn rev_parse(&self, rev: &str) -> Result<String, GitError> {
        let repo = self.open()?;
        let object = repo
            .revparse_single(rev)
            .map_err(|e| GitError::ReferenceNotFound(rev.to_string(), e))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::ReferenceNotFound(rev.to_string(), e))?;
        Ok(commit.id().to_string())
    }

    async fn diff_path(&self, path: &str, staged: bool) -> Result<String, GitError> {
        let source = if staged {
            self.read_status()?.renamed_from.remove(path)
        } else {
            None
        };

        let mut args = vec!["diff", "--no-color", "--no-ext-diff"];
        if staged {
            args.extend(["--cached", "--find-renames"]);
        }
        args.push("--");
        args.extend(source.as_deref());
        args.push(path);
        let diff = self.run_git(&args, "diff").await?;

        if diff.is_empty() && !staged && self.is_untracked(path)? {
            return self.diff_untracked(path).await;
        }
        Ok(diff)
    }

    async fn diff_range(
        &self,
        from: &str,
        to: &str,
        exclude: &[String],
    ) -> Result<String, GitError> {
        let range = format!("{from}..{to}");
        let mut args = vec!["diff", "--no-color", "--no-ext-diff", range.as_str(), "--"];
        args.extend(exclude_args(exclude));
        self.run_git(&args, "diff").await
    }

    async fn show(&self, hash: &str, exclude: &[String]) -> Result<String, GitError> {
        let mut args = vec!["show", "--no-color", "--no-ext-diff", "--format=", hash, "--"];
        args.extend(exclude_args(exclude));
        self.run_git(&args, "show").await
    }

    async fn log(&self, range: &str) -> Result<Vec<Commit>, GitError> {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk().map_err(GitError::Repository)?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .map_err(GitError::Repository)?;
        revwalk
            .push_range(range)
            .map_err(|e| GitError::ReferenceNotFound(range.to_string(), e))?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GitError::Repository)?;
            let commit = repo.find_commit(oid).map_err(GitError::Repository)?;
            commits.push(Commit {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("").to_string(),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
            });
        }
        Ok(commits)
    }

    async fn add(&self, paths: &[String]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--all", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_git(&args, "add").await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<String, GitError> {
        self.run_git(&["commit", "-m", message], "commit").await?;
        self.head_hash().await
    }

    async fn amend_message(&self, message: &str) -> Result<String, GitError> {
        // --only keeps anything staged since out of the amended commit.
        self.run_git(&["commit", "--amend", "--only", "-m", message], "commit --amend")
            .await?;
        self.head_hash().await
    }

    async fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<(), GitError> {
        let mut args = vec!["push"];
        match mode {
            PushMode::Plain => {}
            PushMode::SetUpstream => args.push("--set-upstream"),
            PushMode::ForceWithLease { set_upstream } => {
                args.push("--force-with-lease");
                if set_upstream {
                    args.push("--set-upstream");
                }
            }
        }
        args.extend([remote, branch]);

        match self.run_git(&args, "push").await {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { stderr, .. }) if stderr.contains("[rejected]") => {
                Err(GitError::PushRejected {
                    remote: remote.to_string(),
                    branch: branch.to_string(),
                    stderr,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn checkout_new_branch(&self, name: &str) -> Result<(), GitError> {
        self.run_git(&["checkout", "-b", name], "checkout -b")
            .await
            .map(|_| ())
    }

    async fn add_note(&self, notes_ref: &str, hash: &str, body: &str) -> Result<(), GitError> {
        let ref_arg = format!("--ref={notes_ref}");
        self.run_git(&["notes", &ref_arg, "add", "-f", "-m", body, hash], "notes add")
            .await
            .map(|_| ())
    }

    async fn show_note(&self, notes_ref: &str, hash: &str) -> Result<Option<String>, GitError> {
        let ref_arg = format!("--ref={notes_ref}");
        match self.run_git(&["notes", &ref_arg, "show", hash], "notes show").await {
            Ok(body) => Ok(Some(body.trim_end().to_string())),
            Err(GitError::CommandFailed { stderr, .. }) if stderr.contains("no note found") => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn branch_names(repo: &Repository, kind: BranchType) -> Result<Vec<String>, GitError> {
    let mut names = Vec::new();
    for branch in repo.branches(Some(kind)).map_err(GitError::Repository)? {
        let (branch, _) = branch.map_err(GitError::Repository)?;
        if let Some(name) = branch.name().map_err(GitError::Repository)? {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
