//! Replay of recorded recognizer callbacks.
//!
//! A recording is JSON Lines, one callback per line:
//!
//! ```text
//! {"type":"start"}
//! {"type":"result","results":[{"transcript":"Hello","isFinal":true}]}
//! {"type":"error","error":"no-speech"}
//! {"type":"cancel"}
//! {"type":"end"}
//! ```
//!
//! Unknown or malformed lines are skipped with a warning.

use serde_json::Value;

use crate::speech::event::SpeechEvent;
use crate::speech::session::{
    ListeningService, Recognizer, RecognizerEvent, RecognizerOptions, SessionId, SpeechError,
};

/// One line of a recording.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Event(RecognizerEvent),
    /// The user cancelled at this point.
    Cancel,
}

/// Parse one recording line; `None` for blank, malformed or unknown lines.
pub fn parse_step(line: &str) -> Option<ReplayStep> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_str(line).ok()?;
    let kind = value.get("type")?.as_str()?;

    let event = match kind {
        "start" => RecognizerEvent::Start,
        "result" => RecognizerEvent::Result(SpeechEvent::from_value(&value)),
        "error" => RecognizerEvent::Error(
            value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        ),
        "end" => RecognizerEvent::End,
        "cancel" => return Some(ReplayStep::Cancel),
        _ => return None,
    };
    Some(ReplayStep::Event(event))
}

/// Recognizer stand-in for recorded sessions; capture is a no-op.
#[derive(Debug, Default)]
pub struct ReplayRecognizer {
    starts: u32,
}

impl ReplayRecognizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recognizer for ReplayRecognizer {
    fn start(&mut self, options: &RecognizerOptions) -> Result<(), SpeechError> {
        self.starts += 1;
        log::debug!(
            "replay: start #{} (locale {}, interim {})",
            self.starts,
            options.locale,
            options.interim_results
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        log::debug!("replay: stop");
        Ok(())
    }

    fn abort(&mut self) {
        log::debug!("replay: abort");
    }
}

/// Start a session on `service` and feed it every line of a recording.
///
/// A recording that stops without an `end` line is ended explicitly, the
/// way a recognizer reports `End` after `stop`.
pub async fn replay<I, S>(service: &mut ListeningService, lines: I) -> Result<SessionId, SpeechError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let session = service.start()?;

    for (number, line) in lines.into_iter().enumerate() {
        match parse_step(line.as_ref()) {
            Some(ReplayStep::Event(event)) => service.handle(session, event).await,
            Some(ReplayStep::Cancel) => service.cancel(),
            None if line.as_ref().trim().is_empty() => {}
            None => log::warn!("replay: skipping line {}", number + 1),
        }
    }

    if service.active_session() == Some(session) {
        service.stop()?;
        service.handle(session, RecognizerEvent::End).await;
    }
    Ok(session)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
