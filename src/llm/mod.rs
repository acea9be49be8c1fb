//! Language-model access: backends, prompts and structured replies.

pub mod json;
pub mod process;
pub mod prompt;
pub mod provider;
pub mod schema;

use tracing::debug;

use crate::error::StageError;

pub use json::extract_json;
pub use provider::{CompletionProvider, CompletionRequest, ProviderOptions, ProviderRegistry};
pub use schema::{
    CommitMessageDraft, CommitReview, DescriptionUpdate, PullRequestProposal, ResponseSchema,
    parse_response,
};

/// A selected backend plus the model to request from it.
pub struct ModelClient {
    provider: Box<dyn CompletionProvider>,
    model: Option<String>,
}

impl ModelClient {
    pub fn new(provider: Box<dyn CompletionProvider>, model: Option<String>) -> Self {
        Self { provider, model }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Send `task` (with the shared preamble) and parse the reply as `T`.
    pub async fn ask<T: ResponseSchema>(&self, task: &str) -> Result<T, StageError> {
        let request = CompletionRequest {
            prompt: prompt::with_preamble(task),
            model: self.model.clone(),
        };
        debug!(
            provider = self.provider.name(),
            schema = T::NAME,
            prompt_chars = request.prompt.len(),
            "requesting completion"
        );

        let raw = self.provider.complete(&request).await?;
        debug!(schema = T::NAME, reply_chars = raw.len(), "completion received");

        Ok(parse_response(&raw)?)
    }
}
