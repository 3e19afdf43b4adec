//! Prompt builder for conversation practice.
//!
//! [`PromptBuilder`] constructs two kinds of prompts:
//! * **Dialogue** (`system_instruction`): the role-play instruction sent as
//!   the system message for every turn of a practice scenario.
//! * **Evaluation** (`evaluation_prompt`): asks the model to score the
//!   learner's side of a finished conversation and reply with JSON.

use crate::config::PracticeConfig;
use crate::llm::dialogue::{ChatRole, ChatTurn};
use crate::tts::voice::{base_language, normalize_locale};

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

const DIALOGUE_RULES: &str = "\
Rules:
1. Stay in character for the scenario and keep replies to one to three short sentences.
2. Use vocabulary and grammar suited to the learner's level.
3. Always end with something the learner can respond to.
4. If the learner makes a mistake, model the correct form naturally in your reply; do not lecture.
5. Reply only in the target language.";

const EVALUATION_FORMAT: &str = "\
Reply with ONLY a JSON object, no explanation, in this exact shape:
{\"score\": <integer 0-100>, \"feedback\": \"<two or three sentences>\"}";

/// Default scenario when the learner does not pick one.
pub const DEFAULT_SCENARIO: &str = "a friendly small-talk conversation with a new acquaintance";

/// English display name for common language subtags.
pub fn language_name(locale: &str) -> String {
    let normalized = normalize_locale(locale);
    let name = match base_language(&normalized) {
        "en" => "English",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "th" => "Thai",
        "vi" => "Vietnamese",
        _ => return locale.to_string(),
    };
    name.to_string()
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds practice prompts for one learner profile.
///
/// # Example
/// ```rust
/// use speech_practice::config::PracticeConfig;
/// use speech_practice::llm::PromptBuilder;
///
/// let builder = PromptBuilder::from_config(&PracticeConfig {
///     target_locale: "ja-JP".into(),
///     native_language: "English".into(),
///     level: "beginner".into(),
/// });
/// let system = builder.system_instruction("ordering ramen");
/// assert!(system.contains("Japanese"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    target_language: String,
    native_language: String,
    level: String,
}

impl PromptBuilder {
    pub fn from_config(config: &PracticeConfig) -> Self {
        Self {
            target_language: language_name(&config.target_locale),
            native_language: config.native_language.clone(),
            level: config.level.clone(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// System message for a role-play scenario.
    pub fn system_instruction(&self, scenario: &str) -> String {
        let scenario = if scenario.trim().is_empty() {
            DEFAULT_SCENARIO
        } else {
            scenario.trim()
        };

        let mut prompt = String::with_capacity(512);
        prompt.push_str(&format!(
            "You are a conversation partner helping a {} learner practise {}.\n",
            self.level, self.target_language
        ));
        prompt.push_str(&format!("Scenario: {scenario}.\n"));
        prompt.push_str(&format!(
            "The learner's native language is {}.\n\n",
            self.native_language
        ));
        prompt.push_str(DIALOGUE_RULES);
        prompt
    }

    /// User message asking the model to grade the learner's turns.
    pub fn evaluation_prompt(&self, scenario: &str, turns: &[ChatTurn]) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(&format!(
            "Evaluate the {} of a {} learner in the conversation below (scenario: {}).\n",
            self.target_language,
            self.level,
            if scenario.trim().is_empty() {
                DEFAULT_SCENARIO
            } else {
                scenario.trim()
            }
        ));
        prompt.push_str(
            "Score grammar, vocabulary and how naturally the learner responded. \
             Only the learner's lines are graded.\n",
        );
        prompt.push_str(&format!(
            "Write the feedback in {}.\n\n",
            self.native_language
        ));

        prompt.push_str("Conversation:\n");
        for turn in turns {
            let speaker = match turn.role {
                ChatRole::User => "Learner",
                ChatRole::Model => "Partner",
            };
            prompt.push_str(&format!("{speaker}: {}\n", turn.text));
        }
        prompt.push('\n');
        prompt.push_str(EVALUATION_FORMAT);
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(locale: &str) -> PromptBuilder {
        PromptBuilder::from_config(&PracticeConfig {
            target_locale: locale.into(),
            native_language: "English".into(),
            level: "beginner".into(),
        })
    }

    #[test]
    fn language_names() {
        assert_eq!(language_name("ja-JP"), "Japanese");
        assert_eq!(language_name("ES_mx"), "Spanish");
        assert_eq!(language_name("tlh"), "tlh");
    }

    #[test]
    fn system_instruction_mentions_scenario_and_level() {
        let prompt = builder("fr-FR").system_instruction("buying bread at a bakery");
        assert!(prompt.contains("beginner learner practise French"));
        assert!(prompt.contains("Scenario: buying bread at a bakery."));
        assert!(prompt.contains("Rules:"));
    }

    #[test]
    fn blank_scenario_uses_default() {
        let prompt = builder("en-US").system_instruction("  ");
        assert!(prompt.contains(DEFAULT_SCENARIO));
    }

    #[test]
    fn evaluation_prompt_labels_speakers() {
        let turns = [ChatTurn::model("いらっしゃいませ"), ChatTurn::user("ラーメンをください")];
        let prompt = builder("ja-JP").evaluation_prompt("ordering ramen", &turns);
        assert!(prompt.contains("Partner: いらっしゃいませ"));
        assert!(prompt.contains("Learner: ラーメンをください"));
        assert!(prompt.contains("\"score\""));
        assert!(prompt.contains("feedback in English"));
    }
}
