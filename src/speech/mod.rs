//! Speech-recognition module.
//!
//! # Architecture
//!
//! ```text
//! Recognizer callbacks (start / result / error / end)
//!        │  tagged with SessionId
//!        ▼
//! ListeningService::handle()
//!        │
//!        ├─ SpeechResultTracker::process()  → Final(..) once each, Interim(..)
//!        └─ SpeechResultTracker::finish()   → last interim promoted if no finals
//!        │
//!        ▼
//! mpsc::Receiver<SpeechOutput>  ← consumer
//! ```

pub mod event;
pub mod replay;
pub mod session;
pub mod tracker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use event::{RecognitionResult, SpeechEvent};
pub use replay::{parse_step, replay, ReplayRecognizer, ReplayStep};
pub use session::{
    ListeningService, Recognizer, RecognizerEvent, RecognizerOptions, SessionId, SpeechError,
    SpeechOutput,
};
pub use tracker::{SpeechResultTracker, TrackerState, TrackerUpdate};
