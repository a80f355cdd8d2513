//! Interactive REPL: one grievance per line.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::time::Duration;

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use marcia_core::config::Settings;
use marcia_core::utils::{get_history_path, truncate_string};
use marcia_providers::Gateway;

use crate::{analyze, build_request, helpers, TargetArgs};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "sair", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(
    gateway: &Gateway,
    settings: &Settings,
    target: &TargetArgs,
    timeout: Duration,
    as_json: bool,
) -> Result<()> {
    let provider = target
        .provider
        .clone()
        .unwrap_or_else(|| settings.ai_provider.clone());
    helpers::print_banner(&provider);

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("Você: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nTchau! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        let request = match build_request(settings, trimmed, target) {
            Ok(r) => r,
            Err(e) => {
                helpers::print_error(&e);
                continue;
            }
        };

        debug!(
            provider = %request.provider,
            input = %truncate_string(trimmed, 60),
            "processing grievance"
        );
        helpers::print_thinking();

        match analyze(gateway, &request, timeout).await {
            Ok(result) => {
                helpers::clear_thinking();
                helpers::print_verdict(&result, as_json)?;
            }
            Err(e) => {
                helpers::clear_thinking();
                helpers::print_error(&e);
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
