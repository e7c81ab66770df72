//! Text-generation layer for invest-rs
//!
//! This crate provides provider-agnostic abstractions for prompt-in/text-out
//! generation. It includes:
//!
//! - Message and completion request/response types
//! - The [`LLMProvider`] trait and an OpenAI-compatible implementation
//! - The [`TextGenerator`] seam the analysis stages depend on

pub mod completion;
pub mod error;
pub mod generator;
pub mod messages;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use generator::{CompletionGenerator, GeneratorConfig, TextGenerator};
pub use messages::{Message, Role};
pub use provider::LLMProvider;
