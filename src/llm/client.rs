use super::types::{LLMRequest, LLMResponse};
use crate::error::BackendError;
use async_trait::async_trait;

/// Prompt in, completion out. Implementations own their transport, timeout
/// and credentials; callers decide whether to retry.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    /// Provider display name, e.g. "Groq"
    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }

    /// `"{provider} ({model})"`, or just the provider when the model is unknown
    fn describe(&self) -> String {
        match self.model_info() {
            Some(model) => format!("{} ({})", self.name(), model),
            None => self.name().to_string(),
        }
    }
}
