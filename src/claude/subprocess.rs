//! Claude CLI spawning.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::llm::process::run_cli;
use crate::llm::{CompletionProvider, CompletionRequest};

const PROVIDER: &str = "Claude";
const PROGRAM: &str = "claude";
const INSTALL_HINT: &str = "Install Claude Code: https://docs.anthropic.com/en/docs/claude-code";

/// Wrapper `claude --output-format json` puts around the answer.
#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<String>,
    #[serde(default)]
    is_error: bool,
}

/// Claude Code CLI backend (`claude -p`).
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    timeout: Duration,
}

impl ClaudeProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Check if the Claude CLI is on `PATH`.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_claude_installed() -> Result<(), ProviderError> {
    which::which(PROGRAM)
        .map(|_| ())
        .map_err(|_| ProviderError::NotInstalled {
            provider: PROVIDER,
            hint: INSTALL_HINT,
        })
}

fn build_args(request: &CompletionRequest) -> Vec<&str> {
    let mut args = vec!["-p", request.prompt.as_str(), "--output-format", "json"];
    if let Some(model) = request.model.as_deref() {
        args.extend(["--model", model]);
    }
    args
}

/// Pull the answer text out of the JSON envelope.
///
/// Output that is not an envelope is returned unchanged.
fn unwrap_envelope(stdout: &str) -> Result<String, ProviderError> {
    match serde_json::from_str::<Envelope>(stdout.trim()) {
        Ok(Envelope {
            is_error: true,
            result,
        }) => Err(ProviderError::ExecutionFailed {
            provider: PROVIDER,
            message: result.unwrap_or_else(|| "unknown error".to_string()),
        }),
        Ok(Envelope {
            result: Some(text),
            ..
        }) => Ok(text),
        _ => Ok(stdout.to_string()),
    }
}

#[async_trait]
impl CompletionProvider for ClaudeProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        check_claude_installed()?;
        let stdout = run_cli(PROVIDER, PROGRAM, &build_args(request), self.timeout).await?;
        unwrap_envelope(&stdout)
    }
}
