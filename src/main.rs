//! Application entry point: speech-practice command line.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Dispatch the subcommand.
//!
//! # Subcommands
//!
//! ```text
//! replay <events.jsonl> [locale]   feed a recorded recognizer session through the listener
//! voice <locale> <voices.json>     show which voice the ladder picks
//! chat [scenario]                  practice dialogue on stdin, scored and saved to history
//! say [--voices <voices.json>] <locale> <text…>
//!                                  synthesize text into the audio directory
//! stats                            scores and achievements from history
//! ```

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};

use speech_practice::{
    config::{AppConfig, AppPaths},
    history::{JsonFileStore, SessionHistory, SessionRecord},
    llm::{Conversation, GeminiClient, LlmError, PromptBuilder, DEFAULT_SCENARIO},
    speech::{replay, ListeningService, ReplayRecognizer, SpeechOutput},
    tts::{CloudTtsSynthesizer, FileAudioPlayer, SpeakOutcome, Speaker, VoiceDescriptor, VoiceResolver},
};

const USAGE: &str = "usage: speech-practice <replay <events.jsonl> [locale] | voice <locale> <voices.json> | chat [scenario] | say [--voices <voices.json>] <locale> <text...> | stats>";

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Config
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Dispatch
    let args: Vec<String> = std::env::args().skip(1).collect();
    rt.block_on(run(args, config))
}

async fn run(args: Vec<String>, config: AppConfig) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    match (command.as_str(), rest) {
        ("replay", [path]) => run_replay(&config, path, None).await,
        ("replay", [path, locale]) => run_replay(&config, path, Some(locale)).await,
        ("voice", [locale, path]) => run_voice(&config, locale, path),
        ("chat", []) => run_chat(&config, DEFAULT_SCENARIO).await,
        ("chat", scenario) => run_chat(&config, &scenario.join(" ")).await,
        ("say", rest) => {
            let (voices, rest) = match rest {
                [flag, path, rest @ ..] if flag == "--voices" => (Some(path.as_str()), rest),
                _ => (None, rest),
            };
            match rest {
                [locale, text @ ..] if !text.is_empty() => {
                    run_say(&config, voices, locale, &text.join(" ")).await
                }
                _ => bail!(USAGE),
            }
        }
        ("stats", []) => run_stats(&config),
        _ => bail!(USAGE),
    }
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

async fn run_replay(config: &AppConfig, path: &str, locale: Option<&String>) -> Result<()> {
    let recording =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

    let (mut service, mut outputs) =
        ListeningService::new(Box::new(ReplayRecognizer::new()), &config.speech);
    if let Some(locale) = locale {
        service.set_locale(locale.as_str());
    }

    let printer = tokio::spawn(async move {
        while let Some(output) = outputs.recv().await {
            match output {
                SpeechOutput::Started => println!("[started]"),
                SpeechOutput::Interim(text) => println!("  … {text}"),
                SpeechOutput::Final(text) => println!("final: {text}"),
                SpeechOutput::Error(message) => println!("[error] {message}"),
                SpeechOutput::Ended => println!("[ended]"),
            }
        }
    });

    replay(&mut service, recording.lines()).await?;

    // Dropping the service closes the output channel and ends the printer.
    drop(service);
    printer.await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// voice
// ---------------------------------------------------------------------------

fn load_voices(path: &str) -> Result<Vec<VoiceDescriptor>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    VoiceDescriptor::list_from_json(&raw).with_context(|| format!("{path} is not a voice list"))
}

fn run_voice(config: &AppConfig, locale: &str, path: &str) -> Result<()> {
    let voices = load_voices(path)?;

    let resolver = VoiceResolver::from_config(&config.voice);
    match resolver.resolve_with_rule(Some(locale), &voices) {
        Some((voice, rule)) => println!("{} ({}) via {:?}", voice.name, voice.locale, rule),
        None => println!("no voices available"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

async fn run_chat(config: &AppConfig, scenario: &str) -> Result<()> {
    if config.llm.api_key.is_none() {
        log::warn!("No Gemini API key configured; requests will likely be rejected");
    }

    let backend = Arc::new(GeminiClient::from_config(&config.llm));
    let prompts = PromptBuilder::from_config(&config.practice);
    let mut convo = Conversation::new(
        backend,
        prompts,
        scenario,
        config.llm.max_history_turns,
    );

    println!("Scenario: {scenario}");
    println!("Type your lines; /reset starts over, /end or EOF finishes.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/end" => break,
            "/reset" => {
                convo.reset();
                println!("(conversation reset)");
            }
            "" => {}
            text => match convo.send(text).await {
                Ok(reply) => println!("partner> {}", reply.text),
                Err(e) => log::error!("Dialogue request failed: {e}"),
            },
        }
    }

    if convo.learner_turns() == 0 {
        println!("Nothing to evaluate.");
        return Ok(());
    }

    let evaluation = match convo.evaluate().await {
        Ok(evaluation) => {
            println!("Score: {}/100", evaluation.score);
            println!("{}", evaluation.feedback);
            Some(evaluation)
        }
        Err(e @ LlmError::Parse(_)) | Err(e @ LlmError::EmptyResponse) => {
            log::warn!("Evaluation unusable ({e}); saving session without a score");
            None
        }
        Err(e) => {
            log::error!("Evaluation failed: {e}");
            None
        }
    };

    let mut record = SessionRecord::new(scenario, &config.practice.target_locale, convo.started_at());
    record.duration_secs = (Utc::now() - convo.started_at()).num_seconds().max(0) as u64;
    record.turns = u32::try_from(convo.learner_turns()).unwrap_or(u32::MAX);
    if let Some(evaluation) = evaluation {
        record.score = Some(evaluation.score);
        record.feedback = Some(evaluation.feedback);
    }

    let store = JsonFileStore::open(config.history.resolved_store_file())?;
    let mut history = SessionHistory::new(store, config.history.max_sessions);
    let outcome = history.record(record)?;
    println!("Saved session #{}.", outcome.record.id);
    for achievement in outcome.unlocked {
        println!("Achievement unlocked: {}", achievement.label());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// say
// ---------------------------------------------------------------------------

async fn run_say(
    config: &AppConfig,
    voices: Option<&str>,
    locale: &str,
    text: &str,
) -> Result<()> {
    let audio_dir = AppPaths::new().audio_dir;
    let mut speaker = Speaker::new(
        Arc::new(CloudTtsSynthesizer::from_config(&config.tts)),
        Arc::new(FileAudioPlayer::new(&audio_dir)),
        VoiceResolver::from_config(&config.voice),
        config.tts.clone(),
    );
    if let Some(path) = voices {
        speaker.set_voices(load_voices(path)?);
    }

    let request = speaker.prepare(text, Some(locale));
    log::info!(
        "Speaking as {} ({})",
        request.voice_name.as_deref().unwrap_or("<backend default>"),
        request.locale
    );

    match speaker.speak(text, Some(locale)).await? {
        SpeakOutcome::Completed => println!("Wrote audio to {}", audio_dir.display()),
        SpeakOutcome::Cancelled => println!("Cancelled."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

fn run_stats(config: &AppConfig) -> Result<()> {
    let store = JsonFileStore::open(config.history.resolved_store_file())?;
    let history = SessionHistory::new(store, config.history.max_sessions);
    let summary = history.summary()?;

    println!("Sessions:        {}", summary.sessions);
    println!("Learner turns:   {}", summary.total_turns);
    match summary.average_score {
        Some(avg) => println!("Average score:   {avg:.1} ({} scored)", summary.scored_sessions),
        None => println!("Average score:   -"),
    }
    match summary.best_score {
        Some(best) => println!("Best score:      {best}"),
        None => println!("Best score:      -"),
    }
    if summary.achievements.is_empty() {
        println!("Achievements:    none yet");
    } else {
        println!("Achievements:");
        for achievement in summary.achievements {
            println!("  * {}", achievement.label());
        }
    }
    Ok(())
}
