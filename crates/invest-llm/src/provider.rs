//! Chat-completion backend seam

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A chat-completion backend reached over the network
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short backend label for logs, e.g. `gemini`
    fn name(&self) -> &str;
}
