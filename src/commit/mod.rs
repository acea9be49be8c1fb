//! Commit drafting, commit-message optimization and the diffs both feed the model.

pub mod diff;
pub mod message;
pub mod optimize;
pub mod prompt;
pub mod provenance;

pub use diff::{CollectedDiff, DiffCollector};
pub use message::{CommitDrafter, DraftOutcome};
pub use optimize::{CommitOptimizer, OptimizeOutcome, SkipReason};
pub use provenance::{NOTES_REF, PROCESSED_MARKER, ProvenanceTracker};
