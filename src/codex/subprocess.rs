//! Codex CLI spawning.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::error::ProviderError;
use crate::llm::process::run_cli;
use crate::llm::{CompletionProvider, CompletionRequest};

const PROVIDER: &str = "Codex";
const PROGRAM: &str = "codex";
const INSTALL_HINT: &str = "Install with: npm install -g @openai/codex";

/// OpenAI Codex CLI backend (`codex exec`).
#[derive(Debug, Clone)]
pub struct CodexProvider {
    timeout: Duration,
}

impl CodexProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Check if the Codex CLI is on `PATH`.
pub fn check_codex_installed() -> Result<(), ProviderError> {
    which::which(PROGRAM)
        .map(|_| ())
        .map_err(|_| ProviderError::NotInstalled {
            provider: PROVIDER,
            hint: INSTALL_HINT,
        })
}

/// `codex exec --output-last-message <file> [-m model] <prompt>`
fn build_args<'a>(request: &'a CompletionRequest, last_message: &'a str) -> Vec<&'a str> {
    let mut args = vec!["exec", "--output-last-message", last_message];
    if let Some(model) = request.model.as_deref() {
        args.extend(["-m", model]);
    }
    args.push(request.prompt.as_str());
    args
}

#[async_trait]
impl CompletionProvider for CodexProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        check_codex_installed()?;

        // stdout carries progress output; the final answer goes to this file.
        let last_message = NamedTempFile::new().map_err(|e| ProviderError::ExecutionFailed {
            provider: PROVIDER,
            message: format!("Failed to create output file: {e}"),
        })?;
        let path = last_message.path().display().to_string();

        let stdout = run_cli(PROVIDER, PROGRAM, &build_args(request, &path), self.timeout).await?;

        read_answer(last_message.path(), stdout).await
    }
}

/// The answer file's content, or `stdout` when the file was left empty.
async fn read_answer(path: &Path, stdout: String) -> Result<String, ProviderError> {
    let answer = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ProviderError::ExecutionFailed {
            provider: PROVIDER,
            message: format!("Failed to read output file {}: {e}", path.display()),
        })?;
    if answer.trim().is_empty() {
        Ok(stdout)
    } else {
        Ok(answer)
    }
}
