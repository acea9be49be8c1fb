//! Test-only fakes for running whole workflow scenarios.
//!
//! The mocks generated for each adapter trait suit narrow interaction checks.
//! Multi-stage runs read better against fakes that keep state and record calls.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::confirm::{ConfirmationGate, Gate};
use crate::error::{GitError, HostError, ProviderError};
use crate::git::{Commit, PushMode, VersionControl, WorkingTreeStatus};
use crate::github::{
    NewPullRequest, PullRequestContent, PullRequestEdit, PullRequestRecord, RemoteHost,
};
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::progress::{ProgressEvent, ProgressSink, Severity};

/// A commit with `parents` synthetic parent hashes.
pub fn commit(hash: &str, message: &str, parents: usize) -> Commit {
    Commit {
        hash: hash.to_string(),
        message: message.to_string(),
        parents: (0..parents).map(|i| format!("{hash}^{}", i + 1)).collect(),
    }
}

pub fn open_pr(number: u64, head: &str, base: &str) -> PullRequestRecord {
    PullRequestRecord {
        number,
        url: format!("https://github.com/acme/web/pull/{number}"),
        title: format!("PR {number}"),
        head_ref_name: head.to_string(),
        base_ref_name: base.to_string(),
        is_draft: false,
    }
}

#[derive(Default)]
struct GitState {
    current: String,
    tracking: Option<String>,
    local: Vec<String>,
    remote: Vec<String>,
    status: WorkingTreeStatus,
    path_diffs: HashMap<String, String>,
    range_diff: String,
    shows: HashMap<String, String>,
    logs: HashMap<String, Vec<Commit>>,
    /// Commits created during the run, oldest first.
    created: Vec<Commit>,
    amended_head: Option<Commit>,
    notes: HashMap<(String, String), String>,
    staged: Vec<String>,
    amended: Vec<String>,
    checked_out: Vec<String>,
    pushes: Vec<(String, String, PushMode)>,
    next_id: usize,
}

/// In-memory repository.
pub struct FakeGit {
    state: Mutex<GitState>,
}

impl FakeGit {
    pub fn on_branch(current: &str, tracking: Option<&str>) -> Self {
        let remote = tracking.map_or_else(|| vec!["origin/main".to_string()], |t| vec![t.to_string()]);
        Self {
            state: Mutex::new(GitState {
                current: current.to_string(),
                tracking: tracking.map(str::to_string),
                local: vec![current.to_string()],
                remote,
                ..GitState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, GitState> {
        self.state.lock().unwrap()
    }

    pub fn set_dirty(&self, paths: &[&str]) {
        let mut state = self.state();
        for path in paths {
            state.status.modified.insert(path.to_string());
        }
    }

    /// Unstaged diff returned for `path`; its staged diff stays empty.
    pub fn set_path_diff(&self, path: &str, diff: &str) {
        self.state()
            .path_diffs
            .insert(path.to_string(), diff.to_string());
    }

    /// Returned for every `diff_range` call.
    pub fn set_range_diff(&self, diff: &str) {
        self.state().range_diff = diff.to_string();
    }

    pub fn set_show(&self, hash: &str, diff: &str) {
        self.state()
            .shows
            .insert(hash.to_string(), diff.to_string());
    }

    /// Commits (newest first) already in `range` before the run.
    pub fn set_range_log(&self, range: &str, commits: Vec<Commit>) {
        self.state().logs.insert(range.to_string(), commits);
    }

    pub fn set_local_branches(&self, names: &[&str]) {
        self.state().local = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_remote_branches(&self, names: &[&str]) {
        self.state().remote = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn mark(&self, notes_ref: &str, hash: &str, body: &str) {
        self.state()
            .notes
            .insert((notes_ref.to_string(), hash.to_string()), body.to_string());
    }

    pub fn note(&self, notes_ref: &str, hash: &str) -> Option<String> {
        self.state()
            .notes
            .get(&(notes_ref.to_string(), hash.to_string()))
            .cloned()
    }

    pub fn staged(&self) -> Vec<String> {
        self.state().staged.clone()
    }

    /// Messages passed to `amend_message`.
    pub fn amended(&self) -> Vec<String> {
        self.state().amended.clone()
    }

    pub fn checked_out(&self) -> Vec<String> {
        self.state().checked_out.clone()
    }

    pub fn pushes(&self) -> Vec<(String, String, PushMode)> {
        self.state().pushes.clone()
    }
}

impl GitState {
    fn history(&self, range: &str) -> Vec<Commit> {
        let mut commits: Vec<Commit> = self.created.iter().rev().cloned().collect();
        commits.extend(self.logs.get(range).cloned().unwrap_or_default());
        if let (Some(head), Some(first)) = (&self.amended_head, commits.first_mut()) {
            *first = head.clone();
        }
        commits
    }

    fn next_hash(&mut self) -> String {
        self.next_id += 1;
        format!("fake{:036}", self.next_id)
    }
}

#[async_trait]
impl VersionControl for FakeGit {
    async fn status(&self) -> Result<WorkingTreeStatus, GitError> {
        Ok(self.state().status.clone())
    }

    async fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.state().current.clone())
    }

    async fn tracking_branch(&self, branch: &str) -> Result<Option<String>, GitError> {
        let state = self.state();
        Ok(if branch == state.current {
            state.tracking.clone()
        } else {
            None
        })
    }

    async fn local_branches(&self) -> Result<Vec<String>, GitError> {
        Ok(self.state().local.clone())
    }

    async fn remote_branches(&self) -> Result<Vec<String>, GitError> {
        Ok(self.state().remote.clone())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String, GitError> {
        Ok(rev.to_string())
    }

    async fn diff_path(&self, path: &str, staged: bool) -> Result<String, GitError> {
        if staged {
            return Ok(String::new());
        }
        Ok(self.state().path_diffs.get(path).cloned().unwrap_or_default())
    }

    async fn diff_range(
        &self,
        _from: &str,
        _to: &str,
        _exclude: &[String],
    ) -> Result<String, GitError> {
        Ok(self.state().range_diff.clone())
    }

    async fn show(&self, hash: &str, _exclude: &[String]) -> Result<String, GitError> {
        Ok(self.state().shows.get(hash).cloned().unwrap_or_default())
    }

    async fn log(&self, range: &str) -> Result<Vec<Commit>, GitError> {
        Ok(self.state().history(range))
    }

    async fn add(&self, paths: &[String]) -> Result<(), GitError> {
        self.state().staged.extend(paths.iter().cloned());
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<String, GitError> {
        let mut state = self.state();
        let hash = state.next_hash();
        state.created.push(commit(&hash, message, 1));
        state.status = WorkingTreeStatus::default();
        Ok(hash)
    }

    async fn amend_message(&self, message: &str) -> Result<String, GitError> {
        let mut state = self.state();
        let hash = state.next_hash();
        state.amended.push(message.to_string());
        state.amended_head = Some(commit(&hash, message, 1));
        Ok(hash)
    }

    async fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<(), GitError> {
        self.state()
            .pushes
            .push((remote.to_string(), branch.to_string(), mode));
        Ok(())
    }

    async fn checkout_new_branch(&self, name: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.checked_out.push(name.to_string());
        state.local.push(name.to_string());
        state.current = name.to_string();
        Ok(())
    }

    async fn add_note(&self, notes_ref: &str, hash: &str, body: &str) -> Result<(), GitError> {
        self.mark(notes_ref, hash, body);
        Ok(())
    }

    async fn show_note(&self, notes_ref: &str, hash: &str) -> Result<Option<String>, GitError> {
        Ok(self.note(notes_ref, hash))
    }
}

#[derive(Default)]
struct HostState {
    installed: bool,
    authenticated: bool,
    open: Option<(PullRequestRecord, PullRequestContent)>,
    created: Vec<NewPullRequest>,
    edits: Vec<(u64, Option<String>, Option<String>)>,
}

/// In-memory pull-request host.
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn ready() -> Self {
        Self::with(true, true)
    }

    /// `gh` installed but not logged in.
    pub fn unauthenticated() -> Self {
        Self::with(true, false)
    }

    fn with(installed: bool, authenticated: bool) -> Self {
        Self {
            state: Mutex::new(HostState {
                installed,
                authenticated,
                ..HostState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    pub fn set_open_pr(&self, record: PullRequestRecord, title: &str, body: &str) {
        let content = PullRequestContent {
            title: title.to_string(),
            body: body.to_string(),
        };
        self.state().open = Some((record, content));
    }

    pub fn created(&self) -> Vec<NewPullRequest> {
        self.state().created.clone()
    }

    /// `(number, title, body)` for each edit.
    pub fn edits(&self) -> Vec<(u64, Option<String>, Option<String>)> {
        self.state().edits.clone()
    }
}

#[async_trait]
impl RemoteHost for FakeHost {
    async fn is_installed(&self) -> bool {
        self.state().installed
    }

    async fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    async fn find_open_pr(&self, branch: &str) -> Result<Option<PullRequestRecord>, HostError> {
        Ok(self
            .state()
            .open
            .as_ref()
            .filter(|(record, _)| record.head_ref_name == branch)
            .map(|(record, _)| record.clone()))
    }

    async fn view_pr(&self, number: u64) -> Result<PullRequestContent, HostError> {
        self.state()
            .open
            .as_ref()
            .filter(|(record, _)| record.number == number)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| HostError::CommandFailed {
                operation: "pr view".to_string(),
                stderr: format!("no pull request #{number}"),
            })
    }

    async fn create_pr(&self, request: &NewPullRequest) -> Result<PullRequestRecord, HostError> {
        let mut state = self.state();
        state.created.push(request.clone());
        let number = state.created.len() as u64;
        Ok(PullRequestRecord {
            title: request.title.clone(),
            is_draft: request.draft,
            ..open_pr(number, &request.head, &request.base)
        })
    }

    async fn edit_pr(&self, number: u64, edit: &PullRequestEdit) -> Result<(), HostError> {
        self.state()
            .edits
            .push((number, edit.title.clone(), edit.body.clone()));
        Ok(())
    }
}

/// Replies with canned responses in order and records every prompt.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(str::to_string).collect())),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::ExecutionFailed {
                provider: "Scripted",
                message: "no scripted reply left".to_string(),
            })
    }
}

/// Accepts every gate except the ones listed; selections take the default.
#[derive(Default)]
pub struct ScriptedGate {
    declined: Vec<Gate>,
    asked: Mutex<Vec<Gate>>,
}

impl ScriptedGate {
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn decline(mut self, gate: Gate) -> Self {
        self.declined.push(gate);
        self
    }

    pub fn asked(&self) -> Vec<Gate> {
        self.asked.lock().unwrap().clone()
    }
}

impl ConfirmationGate for ScriptedGate {
    fn confirm(&self, gate: Gate, _prompt: &str) -> io::Result<bool> {
        self.asked.lock().unwrap().push(gate);
        Ok(!self.declined.contains(&gate))
    }

    fn select(&self, _prompt: &str, _items: &[String], default: usize) -> io::Result<usize> {
        Ok(default)
    }
}

/// Keeps every progress event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl ProgressSink for RecordingProgress {
    fn notify(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
