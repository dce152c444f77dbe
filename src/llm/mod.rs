//! Completion service integration for askdb.
//!
//! Provides the `LlmClient` trait, provider implementations, prompt
//! construction and defensive parsing of free-form model output.

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, OllamaConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::{sanitize_sql, strip_code_fence};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for stateless text-completion services.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
/// Nothing about the returned text is guaranteed; callers parse it defensively.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Convenience wrapper sending a single user prompt.
    async fn complete_prompt(&self, prompt: &str) -> Result<String> {
        self.complete(&[Message::user(prompt)]).await
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Local Ollama instance
    #[default]
    Ollama,
    /// OpenAI chat completions
    OpenAi,
    /// Mock client for testing (no model required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
