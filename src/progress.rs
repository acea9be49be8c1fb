//! Structured progress notifications emitted by the workflow.
//!
//! The core never prints. Each stage reports what it is doing through a
//! [`ProgressSink`]; the CLI front-end decides how to render it.

use std::fmt;

use tracing::{error, info, warn};

/// Workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BranchResolution,
    UncommittedChanges,
    CommitOptimization,
    PullRequest,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BranchResolution => "branch resolution",
            Stage::UncommittedChanges => "uncommitted changes",
            Stage::CommitOptimization => "commit optimization",
            Stage::PullRequest => "pull request",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

/// Convenience helpers so call sites stay one line.
pub trait ProgressExt {
    fn info(&self, stage: Stage, message: impl Into<String>);
    fn success(&self, stage: Stage, message: impl Into<String>);
    fn warning(&self, stage: Stage, message: impl Into<String>);
    fn error(&self, stage: Stage, message: impl Into<String>);
}

impl<P: ProgressSink + ?Sized> ProgressExt for P {
    fn info(&self, stage: Stage, message: impl Into<String>) {
        self.notify(event(stage, Severity::Info, message));
    }

    fn success(&self, stage: Stage, message: impl Into<String>) {
        self.notify(event(stage, Severity::Success, message));
    }

    fn warning(&self, stage: Stage, message: impl Into<String>) {
        self.notify(event(stage, Severity::Warning, message));
    }

    fn error(&self, stage: Stage, message: impl Into<String>) {
        self.notify(event(stage, Severity::Error, message));
    }
}

fn event(stage: Stage, severity: Severity, message: impl Into<String>) -> ProgressEvent {
    ProgressEvent {
        stage,
        severity,
        message: message.into(),
    }
}

/// Sink that forwards events to `tracing`.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn notify(&self, event: ProgressEvent) {
        let stage = event.stage.as_str();
        match event.severity {
            Severity::Info | Severity::Success => info!(stage, "{}", event.message),
            Severity::Warning => warn!(stage, "{}", event.message),
            Severity::Error => error!(stage, "{}", event.message),
        }
    }
}
