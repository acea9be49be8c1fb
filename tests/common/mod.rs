//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use git2::{Oid, Repository, Signature};

/// A test git repository builder for integration tests.
///
/// Commits are written with git2; the code under test shells out to `git`, so
/// the repository carries its own identity config.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config
                .set_bool("commit.gpgsign", false)
                .expect("Failed to disable signing");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `content` to `path` (relative to the work tree) without staging it.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(full, content).expect("Failed to write file");
    }

    /// Write the given files, stage them and commit. Returns the commit OID.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to get index");
        for (path, content) in files {
            self.write(path, content);
            index.add_path(Path::new(path)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo.branch(name, &commit, false).expect("Failed to create branch");
    }

    /// Name of the checked-out branch.
    pub fn head_branch(&self) -> String {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .shorthand()
            .expect("HEAD has no name")
            .to_string()
    }

    /// `git mv from to`: move the file on disk and stage the rename.
    pub fn stage_rename(&self, from: &str, to: &str) {
        let root = self.dir.path();
        std::fs::rename(root.join(from), root.join(to)).expect("Failed to rename file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(from)).expect("Failed to unstage old path");
        index.add_path(Path::new(to)).expect("Failed to stage new path");
        index.write().expect("Failed to write index");
    }

    /// Create a bare repository and register it as remote `origin`.
    pub fn bare_origin(&self) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        Repository::init_bare(dir.path()).expect("Failed to init bare repo");
        let url = dir.path().to_str().expect("Temp path is not UTF-8");
        self.repo.remote("origin", url).expect("Failed to add remote");
        dir
    }

    /// Add remote `origin` with a remote-tracking ref for `branch` at `oid`,
    /// and make `branch` track it.
    pub fn track_origin(&self, branch: &str, oid: Oid) {
        self.repo
            .remote("origin", "https://example.com/acme/web.git")
            .expect("Failed to add remote");
        self.repo
            .reference(
                &format!("refs/remotes/origin/{branch}"),
                oid,
                true,
                "test remote ref",
            )
            .expect("Failed to create remote ref");
        let mut local = self
            .repo
            .find_branch(branch, git2::BranchType::Local)
            .expect("Failed to find local branch");
        local
            .set_upstream(Some(&format!("origin/{branch}")))
            .expect("Failed to set upstream");
    }
}
