//! Session history kept in a [`KeyValueStore`].
//!
//! The whole list lives as one JSON array under [`HISTORY_KEY`], newest
//! last.  Achievements are kept under [`ACHIEVEMENTS_KEY`] once earned, so
//! trimming old sessions never takes one away.  The store is read on every
//! query, so several `SessionHistory` values over the same store never
//! disagree.

use crate::history::record::{self, Achievement, SessionRecord};
use crate::history::store::{load_json, save_json, KeyValueStore, StorageError};

pub const HISTORY_KEY: &str = "session_history";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

/// Result of recording a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    /// The stored record, with its id assigned.
    pub record: SessionRecord,
    /// Achievements this session unlocked for the first time.
    pub unlocked: Vec<Achievement>,
}

/// Aggregate view used by the stats screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub scored_sessions: usize,
    pub average_score: Option<f64>,
    pub best_score: Option<u8>,
    pub total_turns: u64,
    pub achievements: Vec<Achievement>,
}

pub struct SessionHistory<S: KeyValueStore> {
    store: S,
    max_sessions: usize,
}

impl<S: KeyValueStore> SessionHistory<S> {
    pub fn new(store: S, max_sessions: usize) -> Self {
        Self {
            store,
            max_sessions: max_sessions.max(1),
        }
    }

    /// All stored sessions, oldest first.
    pub fn sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(load_json(&self.store, HISTORY_KEY)?.unwrap_or_default())
    }

    /// Append `session`, assigning the next id and trimming the oldest
    /// entries beyond the configured maximum.
    pub fn record(&mut self, mut session: SessionRecord) -> Result<RecordOutcome, StorageError> {
        let mut sessions = self.sessions()?;
        let before = self.earned(&sessions)?;

        session.id = sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        sessions.push(session.clone());

        let now = record::achievements(&sessions);
        let unlocked: Vec<Achievement> = now
            .into_iter()
            .filter(|a| !before.contains(a))
            .collect();

        if sessions.len() > self.max_sessions {
            let excess = sessions.len() - self.max_sessions;
            sessions.drain(..excess);
        }

        save_json(&mut self.store, HISTORY_KEY, &sessions)?;
        if !unlocked.is_empty() {
            let earned: Vec<Achievement> = Achievement::ALL
                .into_iter()
                .filter(|a| before.contains(a) || unlocked.contains(a))
                .collect();
            save_json(&mut self.store, ACHIEVEMENTS_KEY, &earned)?;
        }
        log::info!(
            "history: recorded session {} ({} stored)",
            session.id,
            sessions.len()
        );
        for achievement in &unlocked {
            log::info!("history: unlocked {:?}", achievement);
        }

        Ok(RecordOutcome {
            record: session,
            unlocked,
        })
    }

    /// Forget every session and every achievement.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(HISTORY_KEY)?;
        self.store.remove(ACHIEVEMENTS_KEY)
    }

    pub fn average_score(&self) -> Result<Option<f64>, StorageError> {
        Ok(record::average_score(&self.sessions()?))
    }

    pub fn best_score(&self) -> Result<Option<u8>, StorageError> {
        Ok(record::best_score(&self.sessions()?))
    }

    /// Achievements ever earned, in [`Achievement::ALL`] order.
    pub fn achievements(&self) -> Result<Vec<Achievement>, StorageError> {
        self.earned(&self.sessions()?)
    }

    pub fn summary(&self) -> Result<HistorySummary, StorageError> {
        let sessions = self.sessions()?;
        Ok(HistorySummary {
            sessions: sessions.len(),
            scored_sessions: sessions.iter().filter(|s| s.score.is_some()).count(),
            average_score: record::average_score(&sessions),
            best_score: record::best_score(&sessions),
            total_turns: sessions.iter().map(|s| u64::from(s.turns)).sum(),
            achievements: self.earned(&sessions)?,
        })
    }

    /// Stored achievements plus whatever `sessions` satisfy.
    fn earned(&self, sessions: &[SessionRecord]) -> Result<Vec<Achievement>, StorageError> {
        let stored: Vec<Achievement> =
            load_json(&self.store, ACHIEVEMENTS_KEY)?.unwrap_or_default();
        let current = record::achievements(sessions);
        Ok(Achievement::ALL
            .into_iter()
            .filter(|a| stored.contains(a) || current.contains(a))
            .collect())
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::store::{JsonFileStore, MemoryStore};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn session(day: u32, score: Option<u8>, turns: u32) -> SessionRecord {
        SessionRecord {
            score,
            turns,
            ..SessionRecord::new(
                "train station",
                "ja-JP",
                Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
            )
        }
    }

    #[test]
    fn empty_history() {
        let history = SessionHistory::new(MemoryStore::new(), 10);
        assert!(history.sessions().unwrap().is_empty());
        assert_eq!(history.average_score().unwrap(), None);
        assert!(history.achievements().unwrap().is_empty());
    }

    #[test]
    fn record_assigns_ids_and_reports_unlocks() {
        let mut history = SessionHistory::new(MemoryStore::new(), 10);

        let first = history.record(session(1, Some(70), 4)).unwrap();
        assert_eq!(first.record.id, 1);
        assert_eq!(first.unlocked, vec![Achievement::FirstSession]);

        let second = history.record(session(2, Some(95), 6)).unwrap();
        assert_eq!(second.record.id, 2);
        assert_eq!(second.unlocked, vec![Achievement::HighScore]);

        let third = history.record(session(3, Some(50), 2)).unwrap();
        assert_eq!(third.unlocked, vec![Achievement::ThreeDayStreak]);

        let fourth = history.record(session(3, None, 1)).unwrap();
        assert!(fourth.unlocked.is_empty());
    }

    #[test]
    fn summary_aggregates() {
        let mut history = SessionHistory::new(MemoryStore::new(), 10);
        history.record(session(1, Some(60), 3)).unwrap();
        history.record(session(1, None, 2)).unwrap();
        history.record(session(2, Some(90), 5)).unwrap();

        let summary = history.summary().unwrap();
        assert_eq!(summary.sessions, 3);
        assert_eq!(summary.scored_sessions, 2);
        assert_eq!(summary.average_score, Some(75.0));
        assert_eq!(summary.best_score, Some(90));
        assert_eq!(summary.total_turns, 10);
        assert!(summary.achievements.contains(&Achievement::HighScore));
    }

    #[test]
    fn oldest_sessions_are_trimmed_and_ids_keep_increasing() {
        let mut history = SessionHistory::new(MemoryStore::new(), 2);
        for day in 1..=3 {
            history.record(session(day, None, 1)).unwrap();
        }
        let ids: Vec<u64> = history.sessions().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let next = history.record(session(4, None, 1)).unwrap();
        assert_eq!(next.record.id, 4);
    }

    #[test]
    fn clear_removes_everything() {
        let mut history = SessionHistory::new(MemoryStore::new(), 10);
        history.record(session(1, Some(95), 1)).unwrap();
        history.clear().unwrap();
        assert!(history.sessions().unwrap().is_empty());
        assert!(history.achievements().unwrap().is_empty());
    }

    #[test]
    fn achievements_survive_trimming() {
        let mut history = SessionHistory::new(MemoryStore::new(), 2);
        history.record(session(1, Some(95), 1)).unwrap();
        history.record(session(10, None, 1)).unwrap();
        history.record(session(20, None, 1)).unwrap();

        let ids: Vec<u64> = history.sessions().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(history.achievements().unwrap().contains(&Achievement::HighScore));

        let again = history.record(session(25, Some(97), 1)).unwrap();
        assert!(again.unlocked.is_empty());
        assert_eq!(history.best_score().unwrap(), Some(97));
    }

    #[test]
    fn persists_through_file_store() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("history.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            let mut history = SessionHistory::new(store, 10);
            history.record(session(1, Some(88), 7)).unwrap();
        }

        let history = SessionHistory::new(JsonFileStore::open(&path).unwrap(), 10);
        let sessions = history.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].score, Some(88));
        assert_eq!(sessions[0].scenario, "train station");
    }

    #[test]
    fn corrupt_history_is_an_error() {
        let mut store = MemoryStore::new();
        store.set(HISTORY_KEY, "{\"oops\":1}".into()).unwrap();
        let history = SessionHistory::new(store, 10);
        assert!(matches!(history.sessions(), Err(StorageError::Corrupt(_))));
    }
}
