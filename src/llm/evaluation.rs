//! Parsing of model-written evaluations.
//!
//! Models asked for "only JSON" still wrap it in code fences or prose now
//! and then, so [`parse_evaluation`] tries each `{` in turn and reads the
//! first JSON value starting there that deserializes into an [`Evaluation`].

use serde::{Deserialize, Serialize};

use crate::llm::dialogue::LlmError;

/// Score (0–100) and feedback for one practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u8,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Deserialize)]
struct RawEvaluation {
    score: f64,
    #[serde(default)]
    feedback: String,
}

/// Extract an [`Evaluation`] from model output; the score is clamped to 0–100.
pub fn parse_evaluation(text: &str) -> Result<Evaluation, LlmError> {
    for (start, _) in text.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&text[start..]).into_iter::<RawEvaluation>();
        if let Some(Ok(raw)) = values.next() {
            if !raw.score.is_finite() {
                continue;
            }
            return Ok(Evaluation {
                score: raw.score.round().clamp(0.0, 100.0) as u8,
                feedback: raw.feedback.trim().to_string(),
            });
        }
    }

    Err(LlmError::Parse(format!(
        "no evaluation JSON in reply: {}",
        text.chars().take(80).collect::<String>()
    )))
}
