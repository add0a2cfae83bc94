//! Generation provider trait for streamed chat completions

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::Serialize;

use crate::error::Result;
use crate::types::chat::{ChatMessage, MessageRole};

/// A message in the wire format the generation service expects
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
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

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: message.content.clone(),
        }
    }
}

/// Trait for streaming answer generation.
///
/// The returned stream is finite, not restartable, and consumed once.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stream a chat completion as text fragments
    async fn stream_complete(
        &self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<BoxStream<'static, Result<String>>>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the default model
    fn model(&self) -> &str;
}
