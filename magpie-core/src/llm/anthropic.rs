//! Anthropic Messages API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, ChatOptions, ChatResponse, LlmClient};
use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Messages API client
pub struct AnthropicClient {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse> {
        // The Messages API takes the system prompt out of band.
        let system = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n\n");

        let api_messages: Vec<ApiMessage<'_>> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| ApiMessage {
                role: &m.role,
                content: &m.content,
            })
            .collect();

        let request = MessagesRequest {
            model: &options.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: (!system.is_empty()).then_some(system),
            messages: api_messages,
        };

        debug!(model = %options.model, "sending messages request");

        let url = format!("{}/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Malformed provider response: {}", e)))?;

        let content = parsed
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(Error::Llm("Provider response contained no text".to_string()));
        }

        Ok(ChatResponse { content })
    }
}
