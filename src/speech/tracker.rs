//! Speech result tracker.
//!
//! Recognizers that report cumulative results replay every hypothesis on
//! each event.  [`SpeechResultTracker`] turns that replay stream into two
//! clean outputs:
//!
//! * finalized transcript segments, each emitted exactly once;
//! * live interim text, replaced on every event.
//!
//! ```text
//! Idle ──start()──▶ Listening ──process(event)──▶ Listening
//!                       │
//!                       ├──finish()──▶ Idle   (may flush last interim as final)
//!                       └──cancel()──▶ Idle   (emits nothing, ever)
//! ```
//!
//! Some recognizers end a session without marking anything final.  When a
//! session finishes with zero finals but some interim text was seen,
//! [`finish`](SpeechResultTracker::finish) returns the last interim
//! transcript so the user's speech is not silently dropped.

use crate::speech::event::SpeechEvent;

// ---------------------------------------------------------------------------
// TrackerState
// ---------------------------------------------------------------------------

/// Lifecycle of a single listening session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackerState {
    /// No session; events are ignored.
    #[default]
    Idle,
    /// A session is active and events are consumed.
    Listening,
}

impl TrackerState {
    pub fn label(&self) -> &'static str {
        match self {
            TrackerState::Idle => "Idle",
            TrackerState::Listening => "Listening",
        }
    }
}

// ---------------------------------------------------------------------------
// TrackerUpdate
// ---------------------------------------------------------------------------

/// What one event produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerUpdate {
    /// Newly finalized transcripts, in recognition order.
    pub finals: Vec<String>,
    /// The current interim text, if this event carried any.
    pub interim: Option<String>,
}

impl TrackerUpdate {
    pub fn is_empty(&self) -> bool {
        self.finals.is_empty() && self.interim.is_none()
    }
}

// ---------------------------------------------------------------------------
// SpeechResultTracker
// ---------------------------------------------------------------------------

/// De-duplicates cumulative recognizer results for one listening session.
#[derive(Debug, Default)]
pub struct SpeechResultTracker {
    state: TrackerState,
    /// Results before this index have already been emitted as final.
    last_consumed_index: usize,
    finals_emitted: usize,
    last_interim: Option<String>,
}

impl SpeechResultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new session, discarding everything from the previous one.
    pub fn start(&mut self) {
        self.state = TrackerState::Listening;
        self.last_consumed_index = 0;
        self.finals_emitted = 0;
        self.last_interim = None;
    }

    /// Consume one cumulative event.
    ///
    /// Returns an empty update when the tracker is not listening.
    pub fn process(&mut self, event: &SpeechEvent) -> TrackerUpdate {
        let mut update = TrackerUpdate::default();
        if self.state != TrackerState::Listening {
            return update;
        }

        for (index, result) in event
            .results
            .iter()
            .enumerate()
            .skip(self.last_consumed_index)
        {
            if result.is_final {
                self.last_consumed_index = index + 1;
                if result.transcript.trim().is_empty() {
                    continue;
                }
                self.finals_emitted += 1;
                update.finals.push(result.transcript.clone());
            } else {
                update.interim = Some(result.transcript.clone());
                if !result.transcript.trim().is_empty() {
                    self.last_interim = Some(result.transcript.clone());
                }
            }
        }

        update
    }

    /// End the session on end-of-speech.
    ///
    /// Returns the last interim transcript when the session emitted no
    /// finals at all; otherwise `None`.  Always leaves the tracker `Idle`.
    pub fn finish(&mut self) -> Option<String> {
        if self.state != TrackerState::Listening {
            return None;
        }

        let flushed = if self.finals_emitted == 0 {
            self.last_interim.take()
        } else {
            None
        };

        self.reset_idle();
        flushed
    }

    /// Abort the session.  Nothing is emitted until the next [`start`](Self::start).
    pub fn cancel(&mut self) {
        self.reset_idle();
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == TrackerState::Listening
    }

    pub fn last_consumed_index(&self) -> usize {
        self.last_consumed_index
    }

    fn reset_idle(&mut self) {
        self.state = TrackerState::Idle;
        self.last_consumed_index = 0;
        self.finals_emitted = 0;
        self.last_interim = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::event::RecognitionResult;

    fn event(results: &[(&str, bool)]) -> SpeechEvent {
        SpeechEvent::new(
            results
                .iter()
                .map(|(t, f)| RecognitionResult::new(*t, *f))
                .collect(),
        )
    }

    fn listening() -> SpeechResultTracker {
        let mut tracker = SpeechResultTracker::new();
        tracker.start();
        tracker
    }

    #[test]
    fn starts_idle() {
        let tracker = SpeechResultTracker::new();
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert_eq!(tracker.state().label(), "Idle");
    }

    #[test]
    fn cumulative_finals_are_emitted_once() {
        let mut tracker = listening();
        let mut finals = Vec::new();

        finals.extend(tracker.process(&event(&[("Hello", true)])).finals);
        finals.extend(
            tracker
                .process(&event(&[("Hello", true), ("World", true)]))
                .finals,
        );

        assert_eq!(finals, vec!["Hello", "World"]);
        assert_eq!(tracker.last_consumed_index(), 2);
    }

    #[test]
    fn replayed_event_emits_nothing_new() {
        let mut tracker = listening();
        let first = event(&[("a", true), ("b", true)]);
        assert_eq!(tracker.process(&first).finals.len(), 2);
        assert!(tracker.process(&first).finals.is_empty());
    }

    #[test]
    fn growing_prefix_stream_never_duplicates() {
        let mut tracker = listening();
        let words = ["one", "two", "three", "four", "five"];
        let mut finals = Vec::new();

        for n in 1..=words.len() {
            let mut results: Vec<(&str, bool)> = words[..n].iter().map(|w| (*w, true)).collect();
            results.push(("pending", false));
            finals.extend(tracker.process(&event(&results)).finals);
        }

        assert_eq!(finals, words.to_vec());
    }

    #[test]
    fn malformed_entry_does_not_shift_consumed_finals() {
        let mut tracker = listening();
        let first = SpeechEvent::from_value(&serde_json::json!({
            "results": [
                { "isFinal": false },
                { "transcript": "Hello", "isFinal": true }
            ]
        }));
        let second = SpeechEvent::from_value(&serde_json::json!({
            "results": [
                { "transcript": "um", "isFinal": false },
                { "transcript": "Hello", "isFinal": true },
                { "transcript": "World", "isFinal": true }
            ]
        }));

        let mut finals = tracker.process(&first).finals;
        finals.extend(tracker.process(&second).finals);

        assert_eq!(finals, vec!["Hello", "World"]);
        assert_eq!(tracker.last_consumed_index(), 3);
    }

    #[test]
    fn last_interim_wins_without_advancing() {
        let mut tracker = listening();
        let update = tracker.process(&event(&[("Hel", false)]));
        assert_eq!(update.interim.as_deref(), Some("Hel"));
        assert!(update.finals.is_empty());
        assert_eq!(tracker.last_consumed_index(), 0);

        let update = tracker.process(&event(&[("Hello", true), ("wo", false), ("wor", false)]));
        assert_eq!(update.finals, vec!["Hello"]);
        assert_eq!(update.interim.as_deref(), Some("wor"));
        assert_eq!(tracker.last_consumed_index(), 1);
    }

    #[test]
    fn interim_only_session_flushes_last_interim() {
        let mut tracker = listening();
        tracker.process(&event(&[("kon", false)]));
        tracker.process(&event(&[("konnichi", false)]));
        tracker.process(&event(&[("konnichiwa", false)]));

        assert_eq!(tracker.finish().as_deref(), Some("konnichiwa"));
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn empty_session_flushes_nothing() {
        let mut tracker = listening();
        tracker.process(&SpeechEvent::default());
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn no_flush_when_a_final_was_emitted() {
        let mut tracker = listening();
        tracker.process(&event(&[("done", true), ("trailing", false)]));
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn blank_interim_does_not_count_as_observed() {
        let mut tracker = listening();
        tracker.process(&event(&[("   ", false)]));
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn blank_final_advances_but_is_not_emitted() {
        let mut tracker = listening();
        let update = tracker.process(&event(&[(" ", true), ("maybe", false)]));
        assert!(update.finals.is_empty());
        assert_eq!(tracker.last_consumed_index(), 1);
        // No real final was emitted, so the interim is flushed.
        assert_eq!(tracker.finish().as_deref(), Some("maybe"));
    }

    #[test]
    fn cancel_suppresses_in_flight_events() {
        let mut tracker = listening();
        tracker.process(&event(&[("partial", false)]));
        tracker.cancel();

        assert!(tracker.process(&event(&[("late", true)])).is_empty());
        assert_eq!(tracker.finish(), None);
        assert_eq!(tracker.last_consumed_index(), 0);
    }

    #[test]
    fn idle_tracker_ignores_events() {
        let mut tracker = SpeechResultTracker::new();
        assert!(tracker.process(&event(&[("x", true)])).is_empty());
        assert_eq!(tracker.finish(), None);
    }

    #[test]
    fn start_resets_previous_session() {
        let mut tracker = listening();
        tracker.process(&event(&[("a", true), ("b", true)]));
        tracker.finish();

        tracker.start();
        assert_eq!(tracker.last_consumed_index(), 0);
        let update = tracker.process(&event(&[("c", true)]));
        assert_eq!(update.finals, vec!["c"]);
    }
}
