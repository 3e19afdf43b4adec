//! `GeminiClient`: Generative Language API `generateContent` backend.
//!
//! All connection details (`base_url`, `api_key`, `model`) come from
//! [`LlmConfig`].  No automatic retry: failures are returned to the caller.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::llm::dialogue::{ChatTurn, DialogueBackend, DialogueReply, LlmError, TokenUsage};

// ---------------------------------------------------------------------------
// Wire types (response)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl GeminiClient {
    /// Build a client with the per-request timeout from `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, system: &str, history: &[ChatTurn], prompt: &str) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = history
            .iter()
            .chain(std::iter::once(&ChatTurn::user(prompt)))
            .map(|turn| {
                serde_json::json!({
                    "role":  turn.role.as_str(),
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": { "temperature": self.config.temperature }
        });
        if !system.trim().is_empty() {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

fn parse_reply(response: GenerateResponse) -> Result<DialogueReply, LlmError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            reply_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(DialogueReply { text, usage })
}

#[async_trait]
impl DialogueBackend for GeminiClient {
    /// The `x-goog-api-key` header is attached only when `config.api_key`
    /// is a non-empty string.
    async fn reply(
        &self,
        system: &str,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<DialogueReply, LlmError> {
        let mut req = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(system, history, prompt));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.header("x-goog-api-key", key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let reply = parse_reply(parsed)?;
        log::debug!(
            "llm: reply of {} chars ({} tokens)",
            reply.text.chars().count(),
            reply.usage.total_tokens
        );
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
