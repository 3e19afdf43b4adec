//! Text-to-speech module.
//!
//! This module provides:
//! * [`VoiceResolver`] / [`resolve_voice`]: priority ladder for picking a voice.
//! * [`SpeechSynthesizer`]: async trait implemented by synthesis backends.
//! * [`CloudTtsSynthesizer`]: Google Cloud Text-to-Speech REST backend.
//! * [`FallbackSynthesizer`]: tries a primary backend, then an alternate.
//! * [`AudioPlayer`] / [`FileAudioPlayer`]: playback seam.
//! * [`Speaker`]: one utterance in flight, newer utterances cancel older ones.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use speech_practice::config::AppConfig;
//! use speech_practice::tts::{CloudTtsSynthesizer, FileAudioPlayer, Speaker, VoiceResolver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let speaker = Speaker::new(
//!         Arc::new(CloudTtsSynthesizer::from_config(&config.tts)),
//!         Arc::new(FileAudioPlayer::new("out")),
//!         VoiceResolver::from_config(&config.voice),
//!         config.tts.clone(),
//!     );
//!     speaker.speak("こんにちは", Some("ja-JP")).await.unwrap();
//! }
//! ```

pub mod player;
pub mod speaker;
pub mod synthesizer;
pub mod voice;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use player::{AudioPlayer, FileAudioPlayer};
pub use speaker::{SpeakOutcome, Speaker};
pub use synthesizer::{
    CloudTtsSynthesizer, FallbackSynthesizer, SpeakRequest, SpeechSynthesizer, SynthesizedAudio,
    TtsError,
};
pub use voice::{
    base_language, normalize_locale, resolve_voice, VoiceDescriptor, VoiceResolver, VoiceRule,
    DEFAULT_LOCALE,
};
