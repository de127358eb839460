//! OpenAI-compatible chat client
//!
//! Works against any endpoint speaking the Chat Completions protocol; the
//! base URL is configurable for compatible gateways.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, ChatOptions, ChatResponse, LlmClient};
use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Chat Completions API client
pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client with an explicit API key
    pub fn new(api_key: impl Into<String>, api_base: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
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

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse> {
        let request = ChatCompletionRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_response.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!(model = %options.model, messages = messages.len(), "sending chat completion request");

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "Provider returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Malformed provider response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Llm("Provider response contained no content".to_string()))?;

        Ok(ChatResponse { content })
    }
}
