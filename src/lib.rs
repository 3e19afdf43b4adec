//! Speech practice: spoken-language conversation practice.
//!
//! # Architecture
//!
//! ```text
//! Recognizer ──► speech::ListeningService ──► SpeechOutput::Final(text)
//!                                                   │
//!                                                   ▼
//!                                   llm::Conversation (Gemini dialogue)
//!                                                   │ reply text
//!                                                   ▼
//!                    tts::Speaker ──► voice ladder ──► Cloud TTS ──► AudioPlayer
//!
//! llm::Conversation::evaluate() ──► history::SessionHistory (score, achievements)
//! ```
//!
//! Every subsystem reads its settings from [`config::AppConfig`].

pub mod config;
pub mod history;
pub mod llm;
pub mod speech;
pub mod tts;
