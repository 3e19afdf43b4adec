//! Core `DialogueBackend` trait and the types exchanged with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating dialogue.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The model returned no usable text (e.g. blocked by safety filters).
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// There was no learner text to send or evaluate.
    #[error("no learner input")]
    EmptyInput,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Role name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub reply_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueReply {
    pub text: String,
    pub usage: TokenUsage,
}

// ---------------------------------------------------------------------------
// DialogueBackend trait
// ---------------------------------------------------------------------------

/// Async trait for dialogue generation.
///
/// Implementors must be `Send + Sync` so they can be shared behind
/// `Arc<dyn DialogueBackend>`.
///
/// # Arguments
/// * `system`  – System instruction for the whole conversation.
/// * `history` – Previous turns, oldest first.
/// * `prompt`  – The new user message.
#[async_trait]
pub trait DialogueBackend: Send + Sync {
    async fn reply(
        &self,
        system: &str,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<DialogueReply, LlmError>;
}
