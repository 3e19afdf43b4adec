//! Core `SpeechSynthesizer` trait and the Google Cloud TTS implementation.
//!
//! `CloudTtsSynthesizer` calls the `text:synthesize` REST endpoint.  All
//! connection details come from [`TtsConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::config::TtsConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors that can occur while synthesizing or playing speech.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Nothing to say.
    #[error("cannot synthesize empty text")]
    EmptyText,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("TTS request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("TTS API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response could not be parsed or decoded.
    #[error("failed to parse TTS response: {0}")]
    Parse(String),

    /// Audio playback failed.
    #[error("playback failed: {0}")]
    Playback(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Cloud TTS accepted speaking-rate range.
pub const RATE_RANGE: (f32, f32) = (0.25, 4.0);
/// Cloud TTS accepted pitch range, in semitones.
pub const PITCH_RANGE: (f32, f32) = (-20.0, 20.0);

/// A single utterance to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakRequest {
    pub text: String,
    pub locale: String,
    /// Specific voice; `None` lets the backend choose for the locale.
    pub voice_name: Option<String>,
    pub rate: f32,
    pub pitch: f32,
}

impl SpeakRequest {
    /// Build a request with rate and pitch clamped to the accepted ranges.
    pub fn new(
        text: impl Into<String>,
        locale: impl Into<String>,
        voice_name: Option<String>,
        rate: f32,
        pitch: f32,
    ) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
            voice_name,
            rate: clamp_or(rate, RATE_RANGE, 1.0),
            pitch: clamp_or(pitch, PITCH_RANGE, 0.0),
        }
    }
}

fn clamp_or(value: f32, (lo, hi): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

/// Encoded audio returned by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    /// Encoding name as requested (`"MP3"`, `"LINEAR16"`, ...).
    pub encoding: String,
}

impl SynthesizedAudio {
    /// File extension matching the encoding.
    pub fn extension(&self) -> &'static str {
        match self.encoding.to_ascii_uppercase().as_str() {
            "MP3" => "mp3",
            "OGG_OPUS" => "ogg",
            "LINEAR16" => "wav",
            _ => "bin",
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async text-to-speech backend.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn SpeechSynthesizer>`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, TtsError>;
}

// ---------------------------------------------------------------------------
// CloudTtsSynthesizer
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// Google Cloud Text-to-Speech over REST.
pub struct CloudTtsSynthesizer {
    client: reqwest::Client,
    config: TtsConfig,
}

impl CloudTtsSynthesizer {
    /// Build from config with the per-request timeout applied.
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, request: &SpeakRequest) -> serde_json::Value {
        let mut voice = serde_json::json!({ "languageCode": request.locale });
        if let Some(name) = &request.voice_name {
            voice["name"] = serde_json::Value::String(name.clone());
        }

        serde_json::json!({
            "input": { "text": request.text },
            "voice": voice,
            "audioConfig": {
                "audioEncoding": self.config.audio_encoding,
                "speakingRate":  request.rate,
                "pitch":         request.pitch
            }
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudTtsSynthesizer {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, TtsError> {
        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let url = format!("{}/v1/text:synthesize", self.config.base_url);
        let mut req = self.client.post(&url).json(&self.request_body(request));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.query(&[("key", key)]);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TtsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| TtsError::Parse(e.to_string()))?;

        let bytes = decode_audio_content(&parsed.audio_content)?;
        log::debug!(
            "tts: received {} bytes for {} chars ({})",
            bytes.len(),
            request.text.chars().count(),
            request.locale
        );

        Ok(SynthesizedAudio {
            bytes,
            encoding: self.config.audio_encoding.clone(),
        })
    }
}

fn decode_audio_content(content: &str) -> Result<Vec<u8>, TtsError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(content)
        .map_err(|e| TtsError::Parse(format!("invalid base64 audio: {e}")))?;
    if bytes.is_empty() {
        return Err(TtsError::Parse("empty audio content".into()));
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// FallbackSynthesizer
// ---------------------------------------------------------------------------

/// Tries `primary`; on any error other than [`TtsError::EmptyText`] the
/// request goes to `secondary` instead.  Neither backend is retried.
pub struct FallbackSynthesizer<P: SpeechSynthesizer, S: SpeechSynthesizer> {
    primary: P,
    secondary: S,
}

impl<P: SpeechSynthesizer, S: SpeechSynthesizer> FallbackSynthesizer<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P: SpeechSynthesizer, S: SpeechSynthesizer> SpeechSynthesizer for FallbackSynthesizer<P, S> {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, TtsError> {
        match self.primary.synthesize(request).await {
            Ok(audio) => Ok(audio),
            Err(TtsError::EmptyText) => Err(TtsError::EmptyText),
            Err(e) => {
                log::warn!("tts: primary synthesizer failed ({e}), using fallback");
                self.secondary.synthesize(request).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(&'static [u8]);

    #[async_trait]
    impl SpeechSynthesizer for Fixed {
        async fn synthesize(&self, _r: &SpeakRequest) -> Result<SynthesizedAudio, TtsError> {
            Ok(SynthesizedAudio {
                bytes: self.0.to_vec(),
                encoding: "MP3".into(),
            })
        }
    }

    #[derive(Default)]
    struct Failing {
        calls: AtomicUsize,
        empty: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for Failing {
        async fn synthesize(&self, _r: &SpeakRequest) -> Result<SynthesizedAudio, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.empty {
                Err(TtsError::EmptyText)
            } else {
                Err(TtsError::Timeout)
            }
        }
    }

    fn request(text: &str) -> SpeakRequest {
        SpeakRequest::new(text, "ja-JP", Some("ja-JP-Neural2-B".into()), 1.0, 0.0)
    }

    #[test]
    fn request_clamps_rate_and_pitch() {
        let r = SpeakRequest::new("hi", "en-US", None, 10.0, -50.0);
        assert_eq!(r.rate, 4.0);
        assert_eq!(r.pitch, -20.0);

        let r = SpeakRequest::new("hi", "en-US", None, f32::NAN, f32::INFINITY);
        assert_eq!(r.rate, 1.0);
        assert_eq!(r.pitch, 0.0);
    }

    #[test]
    fn body_contains_voice_and_audio_config() {
        let synth = CloudTtsSynthesizer::from_config(&TtsConfig::default());
        let body = synth.request_body(&request("こんにちは"));

        assert_eq!(body["input"]["text"], "こんにちは");
        assert_eq!(body["voice"]["languageCode"], "ja-JP");
        assert_eq!(body["voice"]["name"], "ja-JP-Neural2-B");
        assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(body["audioConfig"]["speakingRate"], 1.0);
    }

    #[test]
    fn body_omits_voice_name_when_unset() {
        let synth = CloudTtsSynthesizer::from_config(&TtsConfig::default());
        let body = synth.request_body(&SpeakRequest::new("hi", "en-US", None, 1.0, 0.0));
        assert!(body["voice"].get("name").is_none());
    }

    #[test]
    fn decodes_audio_content() {
        assert_eq!(decode_audio_content("SGVsbG8gV29ybGQ=").unwrap(), b"Hello World");
        assert!(matches!(decode_audio_content("***"), Err(TtsError::Parse(_))));
        assert!(matches!(decode_audio_content(""), Err(TtsError::Parse(_))));
    }

    #[test]
    fn extension_follows_encoding() {
        let audio = |e: &str| SynthesizedAudio {
            bytes: vec![1],
            encoding: e.into(),
        };
        assert_eq!(audio("MP3").extension(), "mp3");
        assert_eq!(audio("linear16").extension(), "wav");
        assert_eq!(audio("OGG_OPUS").extension(), "ogg");
        assert_eq!(audio("MULAW").extension(), "bin");
    }

    #[tokio::test]
    async fn cloud_rejects_empty_text_without_network() {
        let synth = CloudTtsSynthesizer::from_config(&TtsConfig::default());
        assert!(matches!(
            synth.synthesize(&request("   ")).await,
            Err(TtsError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn fallback_uses_secondary_on_failure() {
        let synth = FallbackSynthesizer::new(Failing::default(), Fixed(b"backup"));
        let audio = synth.synthesize(&request("hello")).await.unwrap();
        assert_eq!(audio.bytes, b"backup");
        assert_eq!(synth.primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_passes_primary_success_through() {
        let synth = FallbackSynthesizer::new(Fixed(b"main"), Failing::default());
        let audio = synth.synthesize(&request("hello")).await.unwrap();
        assert_eq!(audio.bytes, b"main");
        assert_eq!(synth.secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_does_not_mask_empty_text() {
        let primary = Failing {
            empty: true,
            ..Default::default()
        };
        let synth = FallbackSynthesizer::new(primary, Fixed(b"x"));
        assert!(matches!(
            synth.synthesize(&request("")).await,
            Err(TtsError::EmptyText)
        ));
    }

    #[test]
    fn synthesizer_is_object_safe() {
        let _: Box<dyn SpeechSynthesizer> =
            Box::new(CloudTtsSynthesizer::from_config(&TtsConfig::default()));
    }
}
