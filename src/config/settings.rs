//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` loads
//! with the remaining fields at their defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable that overrides [`LlmConfig::api_key`].
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable that overrides [`TtsConfig::api_key`].
pub const TTS_API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-recognition listening session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition locale passed to the recognizer (e.g. `"ja-JP"`).
    pub locale: String,
    /// Ask the recognizer for interim (provisional) hypotheses.
    pub interim_results: bool,
    /// Keep listening across pauses instead of ending after the first phrase.
    pub continuous: bool,
    /// Capacity of the output channel handed to the consumer.
    pub channel_capacity: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            interim_results: true,
            continuous: false,
            channel_capacity: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Vendor preferences used by the voice-selection ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Vendor whose voices are preferred above all others.
    pub primary_vendor: String,
    /// Vendor whose "Neural" voices rank second.
    pub neural_vendor: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            primary_vendor: "Google".into(),
            neural_vendor: "Microsoft".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for Google Cloud Text-to-Speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the Cloud TTS REST API.
    pub base_url: String,
    /// API key: `None` disables the `key` query parameter.
    pub api_key: Option<String>,
    /// Locale used when the caller does not pass one.
    pub default_locale: String,
    /// Speaking rate (1.0 = normal; Cloud TTS accepts 0.25 – 4.0).
    pub rate: f32,
    /// Pitch in semitones (Cloud TTS accepts -20.0 – 20.0).
    pub pitch: f32,
    /// Audio encoding requested from the API (`"MP3"`, `"LINEAR16"`, `"OGG_OPUS"`).
    pub audio_encoding: String,
    /// Maximum seconds to wait for a synthesis response.
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://texttospeech.googleapis.com".into(),
            api_key: None,
            default_locale: "en-US".into(),
            rate: 1.0,
            pitch: 0.0,
            audio_encoding: "MP3".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the Gemini dialogue backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// API key: sent as `x-goog-api-key` when non-empty.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gemini-1.5-flash"`).
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a reply before timing out.
    pub timeout_secs: u64,
    /// Number of turns kept in the rolling conversation history.
    pub max_history_turns: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: "gemini-1.5-flash".into(),
            temperature: 0.7,
            timeout_secs: 30,
            max_history_turns: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// PracticeConfig
// ---------------------------------------------------------------------------

/// What the learner is practising.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Language the learner is practising, as a locale (e.g. `"ja-JP"`).
    pub target_locale: String,
    /// Learner's native language, used for feedback.
    pub native_language: String,
    /// Free-form learner level (e.g. `"beginner"`).
    pub level: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            target_locale: "en-US".into(),
            native_language: "English".into(),
            level: "beginner".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Local session-history persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Explicit store file; `None` uses [`AppPaths::history_file`].
    pub store_file: Option<std::path::PathBuf>,
    /// Oldest sessions are dropped beyond this count.
    pub max_sessions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            store_file: None,
            max_sessions: 200,
        }
    }
}

impl HistoryConfig {
    /// The store file to use, falling back to the platform default.
    pub fn resolved_store_file(&self) -> std::path::PathBuf {
        self.store_file
            .clone()
            .unwrap_or_else(|| AppPaths::new().history_file)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use speech_practice::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub speech: SpeechConfig,
    pub voice: VoiceConfig,
    pub tts: TtsConfig,
    pub llm: LlmConfig,
    pub practice: PracticeConfig,
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`,
    /// then apply API-key overrides from the environment.
    ///
    /// Returns defaults when the file does not exist yet (first run).
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replace API keys with non-empty values returned by `lookup`.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(GEMINI_API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = lookup(TTS_API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.tts.api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
