//! Running a model CLI as a subprocess with a deadline.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ProviderError;

/// Run `program args...`, returning stdout on success.
///
/// The child is killed if it outlives `limit`.
pub async fn run_cli(
    provider: &'static str,
    program: &str,
    args: &[&str],
    limit: Duration,
) -> Result<String, ProviderError> {
    debug!(provider, program, timeout_secs = limit.as_secs(), "spawning model CLI");

    let output = timeout(
        limit,
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| ProviderError::Timeout {
        provider,
        secs: limit.as_secs(),
    })?
    .map_err(|source| ProviderError::SpawnFailed { provider, source })?;

    if !output.status.success() {
        return Err(ProviderError::NonZeroExit {
            provider,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
