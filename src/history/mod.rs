//! Practice history module.
//!
//! This module provides:
//! * [`KeyValueStore`]: string key-value persistence contract.
//! * [`MemoryStore`] / [`JsonFileStore`]: in-process and on-disk stores.
//! * [`SessionRecord`]: one finished practice session.
//! * [`SessionHistory`]: bounded session list with score stats and achievements.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use speech_practice::history::{JsonFileStore, SessionHistory, SessionRecord};
//!
//! let store = JsonFileStore::open("/tmp/history.json").unwrap();
//! let mut history = SessionHistory::new(store, 200);
//!
//! let mut session = SessionRecord::new("ordering coffee", "en-US", Utc::now());
//! session.score = Some(82);
//! let outcome = history.record(session).unwrap();
//! for achievement in outcome.unlocked {
//!     println!("unlocked: {}", achievement.label());
//! }
//! ```

pub mod record;
pub mod sessions;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use record::{Achievement, SessionRecord};
pub use sessions::{HistorySummary, RecordOutcome, SessionHistory, ACHIEVEMENTS_KEY, HISTORY_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
