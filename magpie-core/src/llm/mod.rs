//! LLM provider abstraction
//!
//! The pipeline talks to one [`LlmClient`] and treats the returned content
//! as untrusted text: all structure is recovered downstream by defensive
//! parsing. Clients are constructed explicitly and injected into the job,
//! never cached in module-level singletons.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object response where supported
    pub json_response: bool,
    pub max_tokens: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.2,
            json_response: true,
            max_tokens: 4096,
        }
    }
}

impl ChatOptions {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

/// The raw provider response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Untrusted text content; may wrap JSON in prose or fences
    pub content: String,
}

/// Chat interface every provider implements
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse>;
}
