//! Listening-session service.
//!
//! [`ListeningService`] owns a platform [`Recognizer`] handle and a
//! [`SpeechResultTracker`], and turns raw recognizer callbacks into typed
//! [`SpeechOutput`] events delivered over a `tokio::sync::mpsc` channel.
//!
//! # Session rules
//!
//! * One session at a time: [`start`](ListeningService::start) cancels any
//!   session still in flight.
//! * Every session gets a fresh [`SessionId`].  Recognizer events must be
//!   tagged with the id they belong to; events for any other id are stale
//!   and dropped.
//! * [`cancel`](ListeningService::cancel) is immediate: nothing more is
//!   emitted for that session, even if the recognizer keeps calling back.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::SpeechConfig;
use crate::speech::event::SpeechEvent;
use crate::speech::tracker::SpeechResultTracker;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    /// The platform recognizer refused to start or stop.
    #[error("recognizer error: {0}")]
    Recognizer(String),

    /// The service was disposed and can no longer listen.
    #[error("listening service has been disposed")]
    Disposed,
}

// ---------------------------------------------------------------------------
// Recognizer
// ---------------------------------------------------------------------------

/// Options handed to the recognizer on every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub locale: String,
    pub interim_results: bool,
    pub continuous: bool,
}

impl From<&SpeechConfig> for RecognizerOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            locale: config.locale.clone(),
            interim_results: config.interim_results,
            continuous: config.continuous,
        }
    }
}

/// Platform speech-to-text engine.
///
/// Implementations only start and stop capture; results flow back through
/// [`ListeningService::handle`].
pub trait Recognizer: Send {
    fn start(&mut self, options: &RecognizerOptions) -> Result<(), SpeechError>;

    /// Stop capturing and deliver whatever is pending, then `End`.
    fn stop(&mut self) -> Result<(), SpeechError>;

    /// Stop immediately, discarding pending results.
    fn abort(&mut self);
}

/// Raw callbacks from the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Start,
    Result(SpeechEvent),
    Error(String),
    End,
}

/// Typed events delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutput {
    Started,
    Interim(String),
    Final(String),
    Error(String),
    Ended,
}

pub type SessionId = u64;

// ---------------------------------------------------------------------------
// ListeningService
// ---------------------------------------------------------------------------

pub struct ListeningService {
    recognizer: Option<Box<dyn Recognizer>>,
    options: RecognizerOptions,
    tracker: SpeechResultTracker,
    output_tx: mpsc::Sender<SpeechOutput>,
    /// Id of the session whose events are accepted, if any.
    active: Option<SessionId>,
    next_id: SessionId,
}

impl ListeningService {
    /// Create a service and the receiver its outputs are delivered on.
    pub fn new(
        recognizer: Box<dyn Recognizer>,
        config: &SpeechConfig,
    ) -> (Self, mpsc::Receiver<SpeechOutput>) {
        let (output_tx, output_rx) = mpsc::channel(config.channel_capacity.max(1));
        let service = Self {
            recognizer: Some(recognizer),
            options: RecognizerOptions::from(config),
            tracker: SpeechResultTracker::new(),
            output_tx,
            active: None,
            next_id: 1,
        };
        (service, output_rx)
    }

    /// Change the recognition locale for subsequent sessions.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.options.locale = locale.into();
    }

    /// Start a new session, cancelling any session in flight.
    pub fn start(&mut self) -> Result<SessionId, SpeechError> {
        if self.recognizer.is_none() {
            return Err(SpeechError::Disposed);
        }
        if self.active.is_some() {
            log::debug!("speech: start requested while listening, cancelling previous session");
            self.cancel();
        }

        let id = self.next_id;
        self.next_id += 1;

        self.tracker.start();
        let recognizer = self.recognizer.as_mut().ok_or(SpeechError::Disposed)?;
        if let Err(e) = recognizer.start(&self.options) {
            self.tracker.cancel();
            return Err(e);
        }

        self.active = Some(id);
        log::info!("speech: session {id} started ({})", self.options.locale);
        Ok(id)
    }

    /// Ask the recognizer to finish gracefully.  The session still ends
    /// when the recognizer reports `End`.
    pub fn stop(&mut self) -> Result<(), SpeechError> {
        if self.active.is_none() {
            return Ok(());
        }
        match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.stop(),
            None => Err(SpeechError::Disposed),
        }
    }

    /// Abort the active session; no further output is emitted for it.
    pub fn cancel(&mut self) {
        if let Some(id) = self.active.take() {
            log::info!("speech: session {id} cancelled");
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
        }
        self.tracker.cancel();
    }

    /// Cancel and release the recognizer.  The service cannot start again.
    pub fn dispose(&mut self) {
        self.cancel();
        self.recognizer = None;
        log::debug!("speech: service disposed");
    }

    pub fn is_listening(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    /// Feed one recognizer callback belonging to `session`.
    pub async fn handle(&mut self, session: SessionId, event: RecognizerEvent) {
        if self.active != Some(session) {
            log::debug!("speech: dropping stale event for session {session}");
            return;
        }

        match event {
            RecognizerEvent::Start => self.emit(SpeechOutput::Started).await,
            RecognizerEvent::Result(speech) => {
                let update = self.tracker.process(&speech);
                for text in update.finals {
                    log::debug!("speech: final {text:?}");
                    self.emit(SpeechOutput::Final(text)).await;
                }
                if let Some(text) = update.interim {
                    self.emit(SpeechOutput::Interim(text)).await;
                }
            }
            RecognizerEvent::Error(message) => {
                log::warn!("speech: recognizer error in session {session}: {message}");
                self.emit(SpeechOutput::Error(message)).await;
            }
            RecognizerEvent::End => {
                if let Some(text) = self.tracker.finish() {
                    log::debug!("speech: no final result, promoting last interim {text:?}");
                    self.emit(SpeechOutput::Final(text)).await;
                }
                self.active = None;
                log::info!("speech: session {session} ended");
                self.emit(SpeechOutput::Ended).await;
            }
        }
    }

    async fn emit(&self, output: SpeechOutput) {
        if self.output_tx.send(output).await.is_err() {
            log::debug!("speech: output receiver dropped");
        }
    }
}

impl Drop for ListeningService {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
