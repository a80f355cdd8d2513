//! Shared CLI helpers: path expansion, verdict printing, error hints, banner.

use std::path::PathBuf;

use colored::Colorize;

use marcia_core::{AnalysisResult, PettinessBand};
use marcia_providers::GatewayError;

/// Number of cells in the score gauge.
const GAUGE_WIDTH: usize = 20;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Filled and empty cell counts for a score in `0..=100`.
pub fn gauge_cells(score: u8) -> (usize, usize) {
    let filled = (usize::from(score.min(100)) * GAUGE_WIDTH + 50) / 100;
    (filled, GAUGE_WIDTH - filled)
}

/// Colored `[█████░░░░░]` bar for a score.
fn render_gauge(score: u8) -> String {
    let (filled, empty) = gauge_cells(score);
    let bar = "█".repeat(filled);
    let bar = match PettinessBand::from_score(score) {
        PettinessBand::Legitimate => bar.green(),
        PettinessBand::Reasonable => bar.bright_green(),
        PettinessBand::GettingPetty => bar.yellow(),
        PettinessBand::QuitePetty => bar.bright_red(),
        PettinessBand::PeakPettiness => bar.red().bold(),
    };
    format!("[{}{}]", bar, "░".repeat(empty).dimmed())
}

/// Print a verdict to stdout, as a gauge or as JSON.
pub fn print_verdict(result: &AnalysisResult, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {} {}",
        render_gauge(result.score),
        format!("{}/100", result.score).bold(),
        result.band().label().dimmed()
    );
    println!();
    println!("{}", result.category.cyan().bold());
    println!("{}", result.judgment);
    println!();
    println!("{} {}", "Conselho:".bold(), result.advice);
    println!();
    Ok(())
}

/// Print a failed analysis to stderr, with a settings hint for key problems.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("\n❌ Error: {err}");
    if let Some(hint) = credential_hint(err) {
        eprintln!("{}", hint.yellow());
    }
    eprintln!();
}

/// A suggestion to fix the stored key, if the failure was caused by one.
fn credential_hint(err: &anyhow::Error) -> Option<String> {
    let gateway_err = err.downcast_ref::<GatewayError>()?;
    if !gateway_err.is_credential_problem() {
        return None;
    }
    Some(
        "Check your API key: run `marcia onboard --provider <name> --api-key <key>` \
         or set MARCIA_API_KEYS__<NAME>."
            .to_string(),
    )
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}  {}",
        "⚖️  M.A.R.C.I.A".cyan().bold(),
        version.dimmed(),
        format!("({provider})").dimmed()
    );
    println!(
        "{}",
        "Describe what's bothering you, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" spinner placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ judging...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
