/// State carried from earlier stages to the pull-request stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSession {
    /// A commit was created from uncommitted changes during this run.
    pub commit_created: bool,
    /// The latest commit's message was rewritten during this run.
    pub commit_optimized: bool,
}

impl WorkflowSession {
    /// Whether this run changed history the open PR has not seen yet.
    pub fn touched_commits(&self) -> bool {
        self.commit_created || self.commit_optimized
    }
}
