//! LLM dialogue module.
//!
//! This module provides:
//! * [`DialogueBackend`]: async trait implemented by all dialogue backends.
//! * [`GeminiClient`]: Generative Language API `generateContent` backend.
//! * [`PromptBuilder`]: role-play and evaluation prompts.
//! * [`ConversationHistory`]: rolling window of turns sent with each request.
//! * [`Conversation`]: one practice scenario: send, evaluate, reset.
//! * [`parse_evaluation`] / [`Evaluation`]: score + feedback extraction.
//! * [`LlmError`]: error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use speech_practice::config::AppConfig;
//! use speech_practice::llm::{Conversation, GeminiClient, PromptBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let backend = Arc::new(GeminiClient::from_config(&config.llm));
//!     let prompts = PromptBuilder::from_config(&config.practice);
//!
//!     let mut convo = Conversation::new(backend, prompts, "ordering coffee", 20);
//!     let reply = convo.send("Hi, can I get a latte?").await.unwrap();
//!     println!("{}", reply.text);
//! }
//! ```

pub mod conversation;
pub mod dialogue;
pub mod evaluation;
pub mod gemini;
pub mod history;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use conversation::Conversation;
pub use dialogue::{ChatRole, ChatTurn, DialogueBackend, DialogueReply, LlmError, TokenUsage};
pub use evaluation::{parse_evaluation, Evaluation};
pub use gemini::GeminiClient;
pub use history::ConversationHistory;
pub use prompt::{language_name, PromptBuilder, DEFAULT_SCENARIO};
