//! Marking commits the tool has already reviewed, via git notes.

use tracing::{debug, warn};

use crate::git::VersionControl;

/// Notes ref holding the markers.
pub const NOTES_REF: &str = "refs/notes/prpilot";

/// Note body written on processed commits.
pub const PROCESSED_MARKER: &str = "prpilot:processed";

/// Reads and writes the processed marker.
///
/// Failures are logged and never propagate: an unmarked commit is simply
/// reviewed again on the next run.
pub struct ProvenanceTracker<'a> {
    git: &'a dyn VersionControl,
}

impl<'a> ProvenanceTracker<'a> {
    pub fn new(git: &'a dyn VersionControl) -> Self {
        Self { git }
    }

    pub async fn mark(&self, hash: &str) {
        if self.is_marked(hash).await {
            debug!(hash, "commit already marked");
            return;
        }
        match self.git.add_note(NOTES_REF, hash, PROCESSED_MARKER).await {
            Ok(()) => debug!(hash, "marked commit as processed"),
            Err(e) => warn!(hash, "could not record processed marker: {e}"),
        }
    }

    pub async fn is_marked(&self, hash: &str) -> bool {
        match self.git.show_note(NOTES_REF, hash).await {
            Ok(Some(body)) => body.lines().any(|line| line.trim() == PROCESSED_MARKER),
            Ok(None) => false,
            Err(e) => {
                warn!(hash, "could not read processed marker: {e}");
                false
            }
        }
    }
}
