//! Session records and the arithmetic over them.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One finished practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Assigned by [`SessionHistory::record`](crate::history::SessionHistory::record).
    #[serde(default)]
    pub id: u64,
    pub scenario: String,
    pub locale: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_secs: u64,
    /// Learner turns in the session.
    #[serde(default)]
    pub turns: u32,
    /// 0–100, `None` when the session was not evaluated.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl SessionRecord {
    pub fn new(scenario: impl Into<String>, locale: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            scenario: scenario.into(),
            locale: locale.into(),
            started_at,
            duration_secs: 0,
            turns: 0,
            score: None,
            feedback: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Achievement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Achievement {
    FirstSession,
    TenSessions,
    HighScore,
    PerfectScore,
    ThreeDayStreak,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstSession,
        Achievement::TenSessions,
        Achievement::HighScore,
        Achievement::PerfectScore,
        Achievement::ThreeDayStreak,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Achievement::FirstSession => "First conversation",
            Achievement::TenSessions => "Ten conversations",
            Achievement::HighScore => "Scored 90 or more",
            Achievement::PerfectScore => "Perfect score",
            Achievement::ThreeDayStreak => "Three days in a row",
        }
    }

    fn is_earned(&self, sessions: &[SessionRecord]) -> bool {
        let mut scores = sessions.iter().filter_map(|s| s.score);
        match self {
            Achievement::FirstSession => !sessions.is_empty(),
            Achievement::TenSessions => sessions.len() >= 10,
            Achievement::HighScore => scores.any(|s| s >= 90),
            Achievement::PerfectScore => scores.any(|s| s == 100),
            Achievement::ThreeDayStreak => longest_day_streak(sessions) >= 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Mean score over evaluated sessions.
pub fn average_score(sessions: &[SessionRecord]) -> Option<f64> {
    let scores: Vec<f64> = sessions
        .iter()
        .filter_map(|s| s.score)
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

pub fn best_score(sessions: &[SessionRecord]) -> Option<u8> {
    sessions.iter().filter_map(|s| s.score).max()
}

/// Longest run of consecutive UTC calendar days with at least one session.
pub fn longest_day_streak(sessions: &[SessionRecord]) -> usize {
    let days: BTreeSet<_> = sessions.iter().map(|s| s.started_at.date_naive()).collect();

    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for day in days {
        current = match previous {
            Some(prev) if day - prev == Duration::days(1) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

/// Every achievement the sessions satisfy, in [`Achievement::ALL`] order.
pub fn achievements(sessions: &[SessionRecord]) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| a.is_earned(sessions))
        .collect()
}
