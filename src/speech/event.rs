//! Recognizer event model.
//!
//! A [`SpeechEvent`] is a *cumulative* snapshot: every event carries all
//! hypotheses produced since recognition started, so earlier entries repeat
//! in later events.  De-duplication is the tracker's job.
//!
//! Events usually arrive as JSON from the platform recognizer bridge.
//! [`SpeechEvent::from_value`] never fails; anything malformed becomes an
//! empty (or shorter) result list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recognition hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub transcript: String,
    #[serde(rename = "isFinal", alias = "is_final", default)]
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn new(transcript: impl Into<String>, is_final: bool) -> Self {
        Self {
            transcript: transcript.into(),
            is_final,
        }
    }

    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self::new(transcript, true)
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self::new(transcript, false)
    }
}

/// Cumulative snapshot of all hypotheses since the session started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechEvent {
    #[serde(default)]
    pub results: Vec<RecognitionResult>,
}

impl SpeechEvent {
    pub fn new(results: Vec<RecognitionResult>) -> Self {
        Self { results }
    }

    /// Build an event from loosely-shaped JSON.
    ///
    /// Accepted entry shapes:
    ///
    /// ```text
    /// { "transcript": "hi", "isFinal": true }
    /// { "alternatives": [{ "transcript": "hi" }], "isFinal": true }
    /// { "0": { "transcript": "hi" }, "isFinal": true }
    /// ```
    ///
    /// A missing or non-array `results` yields an empty event.  An entry with
    /// no string transcript becomes an empty interim placeholder: positions
    /// in the cumulative list must stay stable from one event to the next.
    pub fn from_value(value: &Value) -> Self {
        let Some(entries) = value.get("results").and_then(Value::as_array) else {
            log::debug!("speech: event without a results array, treating as empty");
            return Self::default();
        };

        let results = entries
            .iter()
            .map(|entry| {
                parse_entry(entry).unwrap_or_else(|| {
                    log::debug!("speech: malformed result entry, keeping empty slot: {entry}");
                    RecognitionResult::interim("")
                })
            })
            .collect();

        Self { results }
    }

    /// Parse a JSON string; invalid JSON yields an empty event.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                log::debug!("speech: unparseable event ({e}), treating as empty");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn parse_entry(entry: &Value) -> Option<RecognitionResult> {
    let transcript = entry
        .get("transcript")
        .and_then(Value::as_str)
        .or_else(|| {
            entry
                .get("alternatives")
                .and_then(|alts| alts.get(0))
                .and_then(|alt| alt.get("transcript"))
                .and_then(Value::as_str)
        })
        .or_else(|| {
            entry
                .get("0")
                .and_then(|alt| alt.get("transcript"))
                .and_then(Value::as_str)
        })?;

    let is_final = entry
        .get("isFinal")
        .or_else(|| entry.get("is_final"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(RecognitionResult::new(transcript, is_final))
}
