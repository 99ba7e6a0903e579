//! OpenAI API Provider
//!
//! Completion provider over the Chat Completions API. Works with any
//! OpenAI-compatible endpoint via `llm.api_base`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use super::{CompletionProvider, CompletionRequest};
use crate::ai::timeout::with_timeout;
use crate::config::LlmConfig;
use crate::types::{ErrorClassifier, PrdError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const PROVIDER_NAME: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    max_tokens: usize,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PrdError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY or llm.api_key".to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        url::Url::parse(&api_base)
            .map_err(|e| PrdError::Config(format!("Invalid llm.api_base '{}': {}", api_base, e)))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PrdError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_output_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            client,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: request.response_is_json.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), PROVIDER_NAME))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(
                ErrorClassifier::classify_http_status(status.as_u16(), &text, PROVIDER_NAME).into(),
            );
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify(&format!("decode: {}", e), PROVIDER_NAME))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PrdError::malformed(PROVIDER_NAME, "no content in response"))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    #[instrument(
        skip_all,
        fields(model = %self.model, estimated_tokens = request.estimated_tokens())
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let start = Instant::now();
        let body = self.build_request(request);

        let content = with_timeout(self.timeout, self.send(&body), "OpenAI request").await?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Received completion"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
