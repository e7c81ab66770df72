//! Prompt-in/text-out generation
//!
//! Analysis stages only need `generate(prompt) -> text`. [`TextGenerator`] is
//! that seam; [`CompletionGenerator`] implements it over any [`LLMProvider`].

use crate::{CompletionRequest, LLMError, LLMProvider, Result, StopReason};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A service that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt; an empty answer is an error
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Configuration for a completion-backed generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model to use
    pub model: String,

    /// Optional system prompt sent with every request
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: 0.1,
        }
    }
}

/// Single-turn generator over an [`LLMProvider`]
///
/// # Example
///
/// ```no_run
/// use invest_llm::{CompletionGenerator, GeneratorConfig, TextGenerator};
/// use invest_llm::providers::OpenAIProvider;
/// use std::sync::Arc;
///
/// # async fn example() -> invest_llm::Result<()> {
/// let provider = Arc::new(OpenAIProvider::from_env()?);
/// let generator = CompletionGenerator::new(provider, GeneratorConfig::default());
/// let text = generator.generate("Assess the risks of holding NVDA").await?;
/// # Ok(())
/// # }
/// ```
pub struct CompletionGenerator {
    provider: Arc<dyn LLMProvider>,
    config: GeneratorConfig,
}

impl CompletionGenerator {
    /// Create a new generator
    pub fn new(provider: Arc<dyn LLMProvider>, config: GeneratorConfig) -> Self {
        Self { provider, config }
    }

    /// Get the generator's configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for CompletionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut request = CompletionRequest::new(&self.config.model, prompt)
            .with_sampling(self.config.max_tokens, self.config.temperature);
        if let Some(system) = &self.config.system_prompt {
            request = request.with_system(system);
        }

        let response = self.provider.complete(request).await?;
        debug!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "Generation finished"
        );

        if response.stop_reason == StopReason::MaxTokens {
            warn!(model = %self.config.model, "Generation truncated at max_tokens");
        }

        let text = response.text.trim();
        if text.is_empty() {
            return Err(LLMError::EmptyCompletion(self.config.model.clone()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionResponse, Message, TokenUsage};
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(CompletionResponse {
                text: self.reply.clone(),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_tokens, 4096);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_generate_builds_request() {
        let provider = Arc::new(ScriptedProvider::new("  Low risk overall.\n"));
        let config = GeneratorConfig {
            system_prompt: Some("You are terse".to_string()),
            ..GeneratorConfig::default()
        };
        let generator = CompletionGenerator::new(provider.clone(), config);

        let text = generator.generate("Assess AAPL").await.unwrap();
        assert_eq!(text, "Low risk overall.");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gemini-2.5-flash");
        assert_eq!(seen[0].system.as_deref(), Some("You are terse"));
        assert_eq!(seen[0].max_tokens, 4096);
        assert_eq!(
            seen[0].messages(),
            vec![Message::system("You are terse"), Message::user("Assess AAPL")]
        );
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let generator = CompletionGenerator::new(
            Arc::new(ScriptedProvider::new("   ")),
            GeneratorConfig::default(),
        );

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, LLMError::EmptyCompletion(_)));
    }
}
