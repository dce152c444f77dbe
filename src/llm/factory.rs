//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{AskError, Result};
use crate::llm::ollama::DEFAULT_OLLAMA_MODEL;
use crate::llm::openai::DEFAULT_OPENAI_MODEL;
use crate::llm::{
    LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig, OpenAiClient, OpenAiConfig,
};

/// Creates an LLM client for the given provider.
///
/// For OpenAI the API key is resolved in order:
/// 1. Provided `api_key` parameter
/// 2. `OPENAI_API_KEY` environment variable
///
/// The model is taken from `config.model`, then `OLLAMA_MODEL` / `OPENAI_MODEL`,
/// then the provider default. Ollama's URL is taken from `config.base_url`,
/// then `OLLAMA_URL`.
pub fn create_client(
    provider: LlmProvider,
    config: &LlmConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn LlmClient>> {
    debug!("Creating {} completion client", provider);

    match provider {
        LlmProvider::Ollama => {
            let model = resolve_model(
                config.model.as_deref(),
                std::env::var("OLLAMA_MODEL").ok(),
                DEFAULT_OLLAMA_MODEL,
            );
            let mut ollama = OllamaConfig::new(model).with_timeout(config.timeout_secs);
            if let Some(url) = config
                .base_url
                .clone()
                .or_else(|| std::env::var("OLLAMA_URL").ok())
            {
                ollama = ollama.with_url(url);
            }
            Ok(Arc::new(OllamaClient::new(ollama)?))
        }
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    AskError::llm("No API key configured. Set OPENAI_API_KEY.")
                })?;
            let model = resolve_model(
                config.model.as_deref(),
                std::env::var("OPENAI_MODEL").ok(),
                DEFAULT_OPENAI_MODEL,
            );
            let mut openai = OpenAiConfig::new(key, model).with_timeout(config.timeout_secs);
            if let Some(url) = &config.base_url {
                openai = openai.with_url(url.clone());
            }
            Ok(Arc::new(OpenAiClient::new(openai)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

fn resolve_model(explicit: Option<&str>, from_env: Option<String>, default: &str) -> String {
    explicit
        .map(String::from)
        .or(from_env)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
