//! Rolling-window conversation history.
//!
//! [`ConversationHistory`] keeps the last *N* turns sent to the dialogue
//! backend.  Oldest turns are dropped first once the window is full, which
//! bounds prompt size on long practice sessions.  A window always starts on
//! a user turn so the backend never sees a dangling model reply first.

use std::collections::VecDeque;

use crate::llm::dialogue::{ChatRole, ChatTurn};

/// Maintains the rolling window of turns.
///
/// # Example
/// ```rust
/// use speech_practice::llm::{ChatTurn, ConversationHistory};
///
/// let mut history = ConversationHistory::new(4);
/// history.push(ChatTurn::user("Hola"));
/// history.push(ChatTurn::model("¡Hola!"));
/// assert_eq!(history.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ChatTurn>,
    max_turns: usize,
    /// Every turn ever pushed, including those trimmed from the window.
    total_turns: usize,
}

impl ConversationHistory {
    /// A `max_turns` of 0 is treated as 1.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            turns: VecDeque::with_capacity(max_turns + 1),
            max_turns,
            total_turns: 0,
        }
    }

    /// Append a turn, dropping the oldest turns beyond the window.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        self.total_turns += 1;

        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
        while self.turns.len() > 1
            && self.turns.front().is_some_and(|t| t.role == ChatRole::Model)
        {
            self.turns.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.total_turns = 0;
    }

    /// Turns in the window, oldest first.
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of turns pushed since the last clear, trimmed ones included.
    pub fn total_turns(&self) -> usize {
        self.total_turns
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let history = ConversationHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.total_turns(), 0);
    }

    #[test]
    fn window_caps_at_max_turns() {
        let mut history = ConversationHistory::new(4);
        for i in 0..5 {
            history.push(ChatTurn::user(format!("q{i}")));
            history.push(ChatTurn::model(format!("a{i}")));
        }

        let turns = history.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], ChatTurn::user("q3"));
        assert_eq!(turns[3], ChatTurn::model("a4"));
        assert_eq!(history.total_turns(), 10);
    }

    #[test]
    fn odd_window_never_starts_with_model_turn() {
        let mut history = ConversationHistory::new(3);
        history.push(ChatTurn::user("q0"));
        history.push(ChatTurn::model("a0"));
        history.push(ChatTurn::user("q1"));
        history.push(ChatTurn::model("a1"));

        let turns = history.turns();
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns, vec![ChatTurn::user("q1"), ChatTurn::model("a1")]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut history = ConversationHistory::new(2);
        history.push(ChatTurn::user("x"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.total_turns(), 0);
    }

    #[test]
    fn zero_capacity_keeps_one_turn() {
        let mut history = ConversationHistory::new(0);
        history.push(ChatTurn::user("a"));
        history.push(ChatTurn::user("b"));
        assert_eq!(history.turns(), vec![ChatTurn::user("b")]);
    }
}
