//! Speaker: one utterance in flight at a time.
//!
//! [`Speaker::speak`] resolves a voice for the locale, synthesizes the text
//! and waits for playback to finish.  Starting a new utterance cancels the
//! previous one; [`Speaker::stop`] cancels without starting anything.
//! Cancellation is signalled through a `CancellationToken` per utterance and
//! the cancelled call returns [`SpeakOutcome::Cancelled`].

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::config::TtsConfig;
use crate::tts::player::AudioPlayer;
use crate::tts::synthesizer::{SpeakRequest, SpeechSynthesizer, TtsError};
use crate::tts::voice::{VoiceDescriptor, VoiceResolver};

/// How a `speak` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Completed,
    /// Superseded by a newer utterance or stopped.
    Cancelled,
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    resolver: VoiceResolver,
    voices: Vec<VoiceDescriptor>,
    config: TtsConfig,
    in_flight: Mutex<Option<InFlight>>,
    next_generation: Mutex<u64>,
}

impl Speaker {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        resolver: VoiceResolver,
        config: TtsConfig,
    ) -> Self {
        Self {
            synthesizer,
            player,
            resolver,
            voices: Vec::new(),
            config,
            in_flight: Mutex::new(None),
            next_generation: Mutex::new(0),
        }
    }

    /// Replace the list of voices the resolver chooses from.
    pub fn set_voices(&mut self, voices: Vec<VoiceDescriptor>) {
        self.voices = voices;
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    /// Build the request that `speak` would send, without sending it.
    ///
    /// When a voice is resolved its own locale is used so that the voice
    /// name and language code always agree.
    pub fn prepare(&self, text: &str, locale: Option<&str>) -> SpeakRequest {
        let target = locale
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.config.default_locale);

        let (voice_name, request_locale) = match self.resolver.resolve(Some(target), &self.voices)
        {
            Some(voice) => (Some(voice.name.clone()), voice.locale.clone()),
            None => (None, target.to_string()),
        };

        SpeakRequest::new(
            text,
            request_locale,
            voice_name,
            self.config.rate,
            self.config.pitch,
        )
    }

    /// Speak `text`, cancelling whatever is currently being spoken.
    pub async fn speak(&self, text: &str, locale: Option<&str>) -> Result<SpeakOutcome, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let request = self.prepare(text, locale);
        let (generation, token) = self.begin();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("tts: utterance {generation} cancelled");
                Ok(SpeakOutcome::Cancelled)
            }
            result = self.synthesize_and_play(&request) => result.map(|()| SpeakOutcome::Completed),
        };

        self.end(generation);
        outcome
    }

    /// Cancel the utterance in flight, if any.
    pub fn stop(&self) {
        if let Some(current) = self.lock_in_flight().take() {
            log::debug!("tts: stopping utterance {}", current.generation);
            current.token.cancel();
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.lock_in_flight().is_some()
    }

    async fn synthesize_and_play(&self, request: &SpeakRequest) -> Result<(), TtsError> {
        let audio = self.synthesizer.synthesize(request).await?;
        self.player.play(&audio).await
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let generation = {
            let mut next = self
                .next_generation
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *next += 1;
            *next
        };
        let token = CancellationToken::new();

        let previous = self.lock_in_flight().replace(InFlight {
            generation,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            log::debug!(
                "tts: utterance {} superseded by {generation}",
                previous.generation
            );
            previous.token.cancel();
        }

        (generation, token)
    }

    fn end(&self, generation: u64) {
        let mut in_flight = self.lock_in_flight();
        if in_flight
            .as_ref()
            .is_some_and(|current| current.generation == generation)
        {
            *in_flight = None;
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
