//! Settings read from the environment; command-line flags override them.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::llm::ProviderOptions;

pub const PROVIDER_ENV_VAR: &str = "PRPILOT_PROVIDER";
pub const MODEL_ENV_VAR: &str = "PRPILOT_MODEL";
pub const TIMEOUT_ENV_VAR: &str = "PRPILOT_TIMEOUT";

pub const DEFAULT_PROVIDER: &str = "claude";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Registry name of the completion backend.
    pub provider: String,
    pub model: Option<String>,
    /// Limit for one completion subprocess.
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Read `PRPILOT_PROVIDER`, `PRPILOT_MODEL` and `PRPILOT_TIMEOUT`.
    ///
    /// Unset or empty values fall back to the defaults. An unparsable
    /// timeout logs a warning and uses the default.
    pub fn from_env() -> Self {
        Self {
            provider: non_empty(PROVIDER_ENV_VAR).unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            model: non_empty(MODEL_ENV_VAR),
            timeout: timeout_from_env(),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, provider: Option<String>, model: Option<String>) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if model.is_some() {
            self.model = model;
        }
        self
    }

    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            timeout: self.timeout,
        }
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeout_from_env() -> Duration {
    let default = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                default
            }
        },
        Ok(_) => {
            warn!("{TIMEOUT_ENV_VAR} is empty, using default {DEFAULT_TIMEOUT_SECS}s");
            default
        }
        Err(_) => default,
    }
}
