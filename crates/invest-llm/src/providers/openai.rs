//! OpenAI-compatible provider implementation
//!
//! This module implements the LLMProvider trait for the chat completions API.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! Gemini models are reached through Google's OpenAI-compatible endpoint, so
//! the same provider serves both.
//!
//! # Examples
//!
//! ```no_run
//! use invest_llm::{CompletionRequest, LLMProvider};
//! use invest_llm::providers::{OpenAIProvider, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::with_config(OpenAIConfig::gemini("AIza..."))?;
//!
//!     let request = CompletionRequest::new("gemini-2.5-flash", "Summarize the outlook for AAPL")
//!         .with_sampling(512, 0.2);
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text);
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Google's OpenAI-compatible endpoint for Gemini models
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL of the chat completions API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Optional list of supported models
    /// If None, any model string is accepted
    pub supported_models: Option<Vec<String>>,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Config targeting Gemini's OpenAI-compatible endpoint
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::new(api_key).with_api_base(GEMINI_API_BASE)
    }

    /// Create config from environment variables
    ///
    /// Reads `OPENAI_API_KEY` (and `OPENAI_API_BASE` if set). When no OpenAI
    /// key is present, falls back to `GOOGLE_API_KEY` with the Gemini endpoint.
    pub fn from_env() -> Result<Self> {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            let api_base = std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());
            return Ok(Self::new(api_key).with_api_base(api_base));
        }

        std::env::var("GOOGLE_API_KEY").map(Self::gemini).map_err(|_| {
            LLMError::ConfigurationError(
                "neither OPENAI_API_KEY nor GOOGLE_API_KEY environment variable is set".to_string(),
            )
        })
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set supported models list
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = Some(models);
        self
    }

    /// Whether this config points at the Gemini endpoint
    pub fn is_gemini(&self) -> bool {
        self.api_base.starts_with(GEMINI_API_BASE)
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            supported_models: None,
        }
    }
}

/// OpenAI-compatible chat completions provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables (see [`OpenAIConfig::from_env`])
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Validate model name against supported models list (if configured)
    fn validate_model(&self, model: &str) -> Result<()> {
        if let Some(supported) = &self.config.supported_models {
            if !supported.iter().any(|m| m == model) {
                return Err(LLMError::InvalidRequest(format!(
                    "Model '{model}' is not in the supported models list: {supported:?}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending chat completion request");

        self.validate_model(&request.model)?;

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: request.messages().into_iter().map(OpenAIMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        into_completion(openai_response)
    }

    fn name(&self) -> &str {
        if self.config.is_gemini() { "gemini" } else { "openai" }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

impl From<Message> for OpenAIMessage {
    fn from(message: Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        Self {
            role,
            content: message.content,
        }
    }
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        })
        .unwrap_or_default();
    let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));

    debug!(?stop_reason, tokens = usage.total(), "Received completion");

    Ok(CompletionResponse {
        text: choice.message.content.unwrap_or_default(),
        stop_reason,
        usage,
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_gemini_config() {
        let provider = OpenAIProvider::with_config(OpenAIConfig::gemini("g-key").with_timeout(30)).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.config().api_base, GEMINI_API_BASE);
        assert_eq!(provider.config().timeout_secs, 30);
    }

    #[test]
    fn test_model_validation() {
        let config = OpenAIConfig::new("test-key")
            .with_supported_models(vec!["gpt-4o".to_string(), "gemini-2.5-flash".to_string()]);
        let provider = OpenAIProvider::with_config(config).unwrap();

        assert!(provider.validate_model("gemini-2.5-flash").is_ok());
        assert!(matches!(
            provider.validate_model("invalid-model"),
            Err(LLMError::InvalidRequest(_))
        ));
        assert!(OpenAIProvider::new("k").unwrap().validate_model("anything").is_ok());
    }

    // Env vars are process-global; keep every env assertion in one test.
    #[test]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "test-key-from-env");
            std::env::set_var("OPENAI_API_BASE", "https://custom.openai.com/v1");
        }
        let config = OpenAIConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-key-from-env");
        assert_eq!(config.api_base, "https://custom.openai.com/v1");

        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_BASE");
            std::env::set_var("GOOGLE_API_KEY", "google-key");
        }
        let config = OpenAIConfig::from_env().unwrap();
        assert_eq!(config.api_key, "google-key");
        assert!(config.is_gemini());

        unsafe {
            std::env::remove_var("GOOGLE_API_KEY");
        }
        assert!(matches!(
            OpenAIConfig::from_env(),
            Err(LLMError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_request_wire_format() {
        let request = CompletionRequest::new("gemini-2.5-flash", "Review this report")
            .with_system("You are a compliance officer");
        let wire = OpenAIRequest {
            model: request.model.clone(),
            messages: request.messages().into_iter().map(OpenAIMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Review this report");
        assert_eq!(json["max_tokens"], 4096);
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Moderate risk."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        });
        let response: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = into_completion(response).unwrap();

        assert_eq!(completion.text, "Moderate risk.");
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.total(), 128);
    }

    #[test]
    fn test_response_without_choices() {
        let response: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            into_completion(response),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::ContentFilter);
        assert_eq!(map_stop_reason("unknown"), StopReason::EndTurn);
    }
}
