//! Completion Provider Abstraction
//!
//! The pipeline talks to the language model only through
//! [`CompletionProvider`]: a prompt pair goes in, response text comes out.
//! Parsing and validating that text is the caller's job.

mod openai;
#[cfg(test)]
pub(crate) mod testing;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::tokenizer::estimate_tokens;
use crate::config::LlmConfig;
use crate::types::{PrdError, Result};

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Ask the service for a JSON object response
    pub response_is_json: bool,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn json(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            response_is_json: true,
            temperature,
        }
    }

    /// Estimated input cost of both prompts
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.system_prompt) + estimate_tokens(&self.user_prompt)
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Return the raw response text for `request`
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Shared provider handle for the whole run.
pub type SharedProvider = Arc<dyn CompletionProvider>;

/// Create a shared provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => Err(PrdError::Config(format!(
            "Unknown provider: {}. Supported: openai",
            other
        ))),
    }
}
