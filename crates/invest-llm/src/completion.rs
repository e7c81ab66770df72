//! Single-prompt completion types

use crate::Message;

/// One prompt, optionally framed by a system prompt
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Request with the default sampling used by the analysis stages
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            max_tokens: 4096,
            temperature: 0.1,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_sampling(mut self, max_tokens: usize, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Chat messages to send, system prompt first
    pub fn messages(&self) -> Vec<Message> {
        self.system
            .iter()
            .map(Message::system)
            .chain(std::iter::once(Message::user(&self.prompt)))
            .collect()
    }
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    /// Output was cut at `max_tokens`
    MaxTokens,
    /// Output withheld by the provider's content filter
    ContentFilter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Generated text plus provider metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}
