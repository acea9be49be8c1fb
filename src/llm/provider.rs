//! Model backends and the registry that selects one by name.

use std::time::Duration;

use async_trait::async_trait;

use crate::claude::ClaudeProvider;
use crate::codex::CodexProvider;
use crate::error::ProviderError;

/// One prompt for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Backend-specific model identifier; `None` uses the backend default.
    pub model: Option<String>,
}

/// A text-in, text-out model backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Display name, e.g. `Claude`.
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Settings shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderOptions {
    pub timeout: Duration,
}

type Factory = Box<dyn Fn(&ProviderOptions) -> Box<dyn CompletionProvider> + Send + Sync>;

/// Name-keyed provider factories.
pub struct ProviderRegistry {
    entries: Vec<(String, Factory)>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with the built-in `claude` and `codex` backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("claude", |opts| Box::new(ClaudeProvider::new(opts.timeout)));
        registry.register("codex", |opts| Box::new(CodexProvider::new(opts.timeout)));
        registry
    }

    /// Add or replace a backend.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ProviderOptions) -> Box<dyn CompletionProvider> + Send + Sync + 'static,
    {
        let name = name.to_ascii_lowercase();
        self.entries.retain(|(existing, _)| *existing != name);
        self.entries.push((name, Box::new(factory)));
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Instantiate the backend registered under `name` (case-insensitive).
    pub fn create(
        &self,
        name: &str,
        options: &ProviderOptions,
    ) -> Result<Box<dyn CompletionProvider>, ProviderError> {
        let wanted = name.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(registered, _)| *registered == wanted)
            .map(|(_, factory)| factory(options))
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }
}
