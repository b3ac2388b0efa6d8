//! `laid chat`: Interactive or single-message chat mode.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use laid_agent::{
    CommandReply, ConversationLoop, HostInfo, ModeCatalog, ToolDispatcher, TurnOutcome,
    build_system_prompt,
};
use laid_config::{AppConfig, ConfigError};
use laid_core::{PauseSignal, Provider, ToolRegistry};
use laid_providers::OpenAiCompatProvider;

use crate::terminal::{self, TerminalApproval, TerminalRenderer};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

pub async fn run(config_path: &Path, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load_with_env(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let mut agent = build_loop(&config, Arc::new(ToolRegistry::new()));

    if let Some(msg) = message {
        // Single message mode
        let outcome = agent.turn(&msg).await?;
        report(&outcome, &mut agent, &mut config, config_path);
        return Ok(());
    }

    let probe = OpenAiCompatProvider::lm_studio(&config.base_url);
    if !probe.health_check().await.unwrap_or(false) {
        eprintln!(
            "⚠️  Cannot reach LM Studio at {}. Is the server running?",
            config.base_url
        );
    }

    println!();
    println!("  LAID: Local AI-assisted Development");
    println!();
    println!("  Server:  {}", config.base_url);
    println!("  Model:   {} ({})", config.current_model_name(), config.current_model);
    println!("  Modes:   {}", agent.modes().names().join(", "));
    println!();
    println!("  /switch_model        Switch AI model");
    println!("  /mode <name>         Set agent mode (/mode off to clear)");
    println!("  /pause or Ctrl+C     Pause agent for guidance");
    println!("  exit, quit, q        Leave");
    println!();

    let in_turn = Arc::new(AtomicBool::new(false));
    spawn_interrupt_handler(agent.pause_handle(), in_turn.clone());

    loop {
        print!("You > ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = terminal::read_line().await? else {
            // EOF (Ctrl+D)
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&line.to_ascii_lowercase().as_str()) {
            break;
        }

        in_turn.store(true, Ordering::SeqCst);
        let result = agent.turn(line).await;
        in_turn.store(false, Ordering::SeqCst);

        match result {
            Ok(outcome) => report(&outcome, &mut agent, &mut config, config_path),
            Err(e) => eprintln!("Chat error: {e}"),
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}

/// Wire configuration, transport, tools and terminal together.
pub fn build_loop(config: &AppConfig, tools: Arc<ToolRegistry>) -> ConversationLoop {
    let provider = Arc::new(OpenAiCompatProvider::lm_studio(&config.base_url));
    let dispatcher = ToolDispatcher::new(tools, Arc::new(TerminalApproval))
        .with_timeout(Duration::from_secs(config.tool_timeout_secs));
    let system_prompt = build_system_prompt(config.instructions.as_deref(), &HostInfo::detect());

    ConversationLoop::new(provider, &config.current_model, dispatcher, system_prompt)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_max_tool_rounds(config.max_tool_rounds)
        .with_modes(ModeCatalog::with_overrides(&config.modes))
        .with_sink(Arc::new(TerminalRenderer::default()))
}

/// Ctrl+C pauses a running turn; at the prompt it exits.
fn spawn_interrupt_handler(pause: PauseSignal, in_turn: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if in_turn.load(Ordering::SeqCst) {
                tracing::debug!("Ctrl+C during turn, requesting pause");
                pause.request();
            } else {
                println!();
                std::process::exit(130);
            }
        }
    });
}

fn report(outcome: &TurnOutcome, agent: &mut ConversationLoop, config: &mut AppConfig, path: &Path) {
    match outcome {
        // Text and pause notices were already rendered live
        TurnOutcome::Answer(_) | TurnOutcome::Paused { .. } => {}
        TurnOutcome::RoundLimit { rounds } => {
            eprintln!("⚠️  Stopped after {rounds} tool rounds. Send a message to continue.");
        }
        TurnOutcome::Handled(CommandReply::SwitchModel { selector: Some(selector) }) => {
            match AppConfig::persist_model_switch(path, selector) {
                Ok(entry) => {
                    config.current_model = entry.id.clone();
                    agent.set_model(&entry.id);
                    println!("✅ Switched to: {}", entry.name);
                }
                Err(ConfigError::ModelNotFound(selector)) => {
                    println!("❌ Model not found: {selector}");
                }
                Err(e) => eprintln!("Chat error: {e}"),
            }
        }
        TurnOutcome::Handled(reply) => println!("{}", describe_reply(reply, config)),
    }
}

/// Text shown for a command that needs no further work.
pub fn describe_reply(reply: &CommandReply, config: &AppConfig) -> String {
    match reply {
        CommandReply::ModeSet(name) => format!("🎯 Mode set to: {name}"),
        CommandReply::ModeCleared => "Mode cleared".into(),
        CommandReply::UnknownMode { requested, available } => format!(
            "❌ Unknown mode: {requested}. Available: {}",
            available.join(", ")
        ),
        CommandReply::ModeStatus { active, available } => format!(
            "Current mode: {}. Available: {}",
            active.as_deref().unwrap_or("none"),
            available.join(", ")
        ),
        CommandReply::SwitchModel { .. } => format_model_list(config),
        CommandReply::PauseAcknowledged => "⏸️  Paused. Type guidance to continue.".into(),
    }
}

/// The catalog as a numbered table with the current model marked.
pub fn format_model_list(config: &AppConfig) -> String {
    if config.available_models.is_empty() {
        return format!(
            "No models in the catalog. Current model: {}",
            config.current_model
        );
    }

    let mut out = String::from("Available models:\n");
    for (i, model) in config.available_models.iter().enumerate() {
        let status = if model.id == config.current_model {
            "✅ Current"
        } else {
            "Available"
        };
        out.push_str(&format!(
            "  {:>2}  {:<24} {:<32} {status}\n",
            i + 1,
            model.name,
            model.id
        ));
    }
    out.push_str("Usage: /switch_model <number> or /switch_model <model_id>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use laid_config::ModelEntry;

    fn config() -> AppConfig {
        AppConfig {
            available_models: vec![
                ModelEntry::new("google/gemma-3-4b", "Gemma 3 4B"),
                ModelEntry::new("qwen/qwen3-8b", "Qwen3 8B"),
            ],
            ..AppConfig::default()
        }
    }

    #[test]
    fn model_list_marks_current() {
        let list = format_model_list(&config());
        let lines: Vec<_> = list.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Gemma 3 4B") && lines[1].contains("Current"));
        assert!(lines[2].contains("qwen/qwen3-8b") && !lines[2].contains("Current"));
        assert!(lines[3].starts_with("Usage: /switch_model"));
    }

    #[test]
    fn empty_catalog_names_current_model() {
        let config = AppConfig {
            available_models: vec![],
            ..AppConfig::default()
        };
        assert!(format_model_list(&config).contains("google/gemma-3-4b"));
    }

    #[test]
    fn mode_replies() {
        let config = config();
        let available = vec!["act".to_string(), "planning".to_string()];
        assert_eq!(
            describe_reply(&CommandReply::ModeSet("act".into()), &config),
            "🎯 Mode set to: act"
        );
        assert_eq!(
            describe_reply(
                &CommandReply::UnknownMode {
                    requested: "yolo".into(),
                    available: available.clone()
                },
                &config
            ),
            "❌ Unknown mode: yolo. Available: act, planning"
        );
        assert_eq!(
            describe_reply(
                &CommandReply::ModeStatus {
                    active: None,
                    available
                },
                &config
            ),
            "Current mode: none. Available: act, planning"
        );
    }

    #[test]
    fn switch_model_without_selector_lists_catalog() {
        let reply = CommandReply::SwitchModel { selector: None };
        assert!(describe_reply(&reply, &config()).starts_with("Available models:"));
    }

    #[test]
    fn exit_words() {
        for word in ["exit", "quit", "q"] {
            assert!(EXIT_WORDS.contains(&word));
        }
    }
}
