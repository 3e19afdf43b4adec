//! A single practice conversation.
//!
//! [`Conversation`] binds a [`DialogueBackend`] to a scenario.  It keeps two
//! views of the exchange: the bounded [`ConversationHistory`] window that is
//! sent with every request, and the full transcript used for evaluation and
//! session bookkeeping.  Turns are recorded only after the backend replied,
//! so a failed request leaves the conversation unchanged and can be retried
//! by the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::llm::dialogue::{ChatRole, ChatTurn, DialogueBackend, DialogueReply, LlmError, TokenUsage};
use crate::llm::evaluation::{parse_evaluation, Evaluation};
use crate::llm::history::ConversationHistory;
use crate::llm::prompt::PromptBuilder;

pub struct Conversation {
    backend: Arc<dyn DialogueBackend>,
    prompts: PromptBuilder,
    scenario: String,
    system: String,
    history: ConversationHistory,
    transcript: Vec<ChatTurn>,
    usage: TokenUsage,
    started_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        backend: Arc<dyn DialogueBackend>,
        prompts: PromptBuilder,
        scenario: impl Into<String>,
        max_history_turns: usize,
    ) -> Self {
        let scenario = scenario.into();
        let system = prompts.system_instruction(&scenario);
        Self {
            backend,
            prompts,
            scenario,
            system,
            history: ConversationHistory::new(max_history_turns),
            transcript: Vec::new(),
            usage: TokenUsage::default(),
            started_at: Utc::now(),
        }
    }

    /// Send a learner message and record both sides on success.
    pub async fn send(&mut self, text: &str) -> Result<DialogueReply, LlmError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let reply = self
            .backend
            .reply(&self.system, &self.history.turns(), text)
            .await?;

        for turn in [ChatTurn::user(text), ChatTurn::model(reply.text.clone())] {
            self.history.push(turn.clone());
            self.transcript.push(turn);
        }
        self.add_usage(reply.usage);

        Ok(reply)
    }

    /// Ask the backend to grade the learner's side of the transcript.
    ///
    /// The evaluation request is stateless: it is not added to the history.
    pub async fn evaluate(&mut self) -> Result<Evaluation, LlmError> {
        if self.learner_turns() == 0 {
            return Err(LlmError::EmptyInput);
        }

        let prompt = self.prompts.evaluation_prompt(&self.scenario, &self.transcript);
        let reply = self.backend.reply("", &[], &prompt).await?;
        self.add_usage(reply.usage);

        let evaluation = parse_evaluation(&reply.text)?;
        log::info!("llm: session scored {}", evaluation.score);
        Ok(evaluation)
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn learner_turns(&self) -> usize {
        self.transcript
            .iter()
            .filter(|t| t.role == ChatRole::User)
            .count()
    }

    /// Tokens spent so far, evaluations included.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Forget the exchange but keep the scenario.
    pub fn reset(&mut self) {
        self.history.clear();
        self.transcript.clear();
        self.usage = TokenUsage::default();
        self.started_at = Utc::now();
    }

    fn add_usage(&mut self, usage: TokenUsage) {
        self.usage.prompt_tokens = self.usage.prompt_tokens.saturating_add(usage.prompt_tokens);
        self.usage.reply_tokens = self.usage.reply_tokens.saturating_add(usage.reply_tokens);
        self.usage.total_tokens = self.usage.total_tokens.saturating_add(usage.total_tokens);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PracticeConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the prompt back and records what it was sent.
    #[derive(Default)]
    struct EchoBackend {
        seen: Mutex<Vec<(String, usize, String)>>,
        evaluation: Option<&'static str>,
    }

    #[async_trait]
    impl DialogueBackend for EchoBackend {
        async fn reply(
            &self,
            system: &str,
            history: &[ChatTurn],
            prompt: &str,
        ) -> Result<DialogueReply, LlmError> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), history.len(), prompt.to_string()));
            let text = match (system.is_empty(), self.evaluation) {
                (true, Some(json)) => json.to_string(),
                _ => format!("echo: {prompt}"),
            };
            Ok(DialogueReply {
                text,
                usage: TokenUsage {
                    prompt_tokens: 10,
                    reply_tokens: 5,
                    total_tokens: 15,
                },
            })
        }
    }

    struct DownBackend;

    #[async_trait]
    impl DialogueBackend for DownBackend {
        async fn reply(&self, _: &str, _: &[ChatTurn], _: &str) -> Result<DialogueReply, LlmError> {
            Err(LlmError::Timeout)
        }
    }

    fn conversation(backend: Arc<dyn DialogueBackend>) -> Conversation {
        let prompts = PromptBuilder::from_config(&PracticeConfig {
            target_locale: "es-ES".into(),
            ..PracticeConfig::default()
        });
        Conversation::new(backend, prompts, "ordering tapas", 4)
    }

    #[tokio::test]
    async fn send_records_both_turns_and_usage() {
        let backend = Arc::new(EchoBackend::default());
        let mut convo = conversation(backend.clone());

        let reply = convo.send("  Una caña, por favor ").await.unwrap();
        assert_eq!(reply.text, "echo: Una caña, por favor");
        convo.send("Y unas patatas bravas").await.unwrap();

        assert_eq!(convo.transcript().len(), 4);
        assert_eq!(convo.learner_turns(), 2);
        assert_eq!(convo.usage().total_tokens, 30);

        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].0.contains("ordering tapas"));
        assert_eq!(seen[0].1, 0);
        assert_eq!(seen[1].1, 2);
    }

    #[tokio::test]
    async fn failed_send_leaves_conversation_unchanged() {
        let mut convo = conversation(Arc::new(DownBackend));
        assert!(matches!(convo.send("hola").await, Err(LlmError::Timeout)));
        assert!(convo.transcript().is_empty());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let mut convo = conversation(Arc::new(EchoBackend::default()));
        assert!(matches!(convo.send("   ").await, Err(LlmError::EmptyInput)));
    }

    #[tokio::test]
    async fn evaluate_parses_score_without_touching_history() {
        let backend = Arc::new(EchoBackend {
            evaluation: Some(r#"{"score": 74, "feedback": "Nice."}"#),
            ..Default::default()
        });
        let mut convo = conversation(backend.clone());
        convo.send("Hola").await.unwrap();

        let eval = convo.evaluate().await.unwrap();
        assert_eq!(eval.score, 74);
        assert_eq!(convo.transcript().len(), 2);

        let seen = backend.seen.lock().unwrap();
        let (system, history_len, prompt) = &seen[1];
        assert!(system.is_empty());
        assert_eq!(*history_len, 0);
        assert!(prompt.contains("Learner: Hola"));
    }

    #[tokio::test]
    async fn evaluate_requires_learner_input() {
        let mut convo = conversation(Arc::new(EchoBackend::default()));
        assert!(matches!(convo.evaluate().await, Err(LlmError::EmptyInput)));
    }

    struct HugeUsageBackend;

    #[async_trait]
    impl DialogueBackend for HugeUsageBackend {
        async fn reply(&self, _: &str, _: &[ChatTurn], _: &str) -> Result<DialogueReply, LlmError> {
            Ok(DialogueReply {
                text: "sí".into(),
                usage: TokenUsage {
                    prompt_tokens: u32::MAX - 1,
                    reply_tokens: 7,
                    total_tokens: u32::MAX,
                },
            })
        }
    }

    #[tokio::test]
    async fn usage_saturates_instead_of_overflowing() {
        let mut convo = conversation(Arc::new(HugeUsageBackend));
        convo.send("uno").await.unwrap();
        convo.send("dos").await.unwrap();

        let usage = convo.usage();
        assert_eq!(usage.prompt_tokens, u32::MAX);
        assert_eq!(usage.reply_tokens, 14);
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[tokio::test]
    async fn reset_clears_transcript() {
        let mut convo = conversation(Arc::new(EchoBackend::default()));
        convo.send("hola").await.unwrap();
        convo.reset();
        assert!(convo.transcript().is_empty());
        assert_eq!(convo.usage(), TokenUsage::default());
        assert_eq!(convo.scenario(), "ordering tapas");
    }
}
