//! `marcia status` and `marcia providers`.
//!
//! - Shows settings path, active provider, Ollama settings, proxy
//! - Lists every supported provider with its API key status

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use marcia_core::config::{load_settings, Settings};
use marcia_providers::ProviderDescriptor;

use crate::build_gateway;

/// Run the status command.
pub fn run(settings_path: &Path) -> Result<()> {
    let settings = load_settings(Some(settings_path));

    println!();
    println!("{}", "⚖️  M.A.R.C.I.A Status".cyan().bold());
    println!();

    let exists = settings_path.exists();
    println!(
        "  {:<18} {} {}",
        "Settings:".bold(),
        settings_path.display(),
        if exists {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    let provider = match settings.provider() {
        Ok(id) => id.to_string(),
        Err(e) => format!("{} ({})", settings.ai_provider, e.to_string().red()),
    };
    println!("  {:<18} {}", "Provider:".bold(), provider);

    println!(
        "  {:<18} {} | model: {}",
        "Ollama:".bold(),
        settings.ollama_url,
        settings.ollama_model.dimmed(),
    );
    println!(
        "  {:<18} {}",
        "Proxy:".bold(),
        settings.proxy_url().unwrap_or("(direct)")
    );
    println!(
        "  {:<18} {}s | locale: {}",
        "Timeout:".bold(),
        settings.request_timeout_secs,
        settings.selected_locale.dimmed(),
    );
    println!();

    Ok(())
}

/// Run the providers command.
pub fn providers(settings: &Settings) -> Result<()> {
    let gateway = build_gateway(settings)?;
    let active = settings.provider().ok();

    println!();
    println!("  {}", "Providers:".bold());
    for spec in gateway.list_providers() {
        let marker = if Some(spec.id) == active { "▶" } else { " " };
        println!(
            "  {} {:<10} {:<24} {}",
            marker,
            spec.id.as_str(),
            spec.display_name,
            key_status(spec, settings)
        );
    }
    println!();

    Ok(())
}

fn key_status(spec: &ProviderDescriptor, settings: &Settings) -> String {
    if spec.is_local() {
        format!("{} {}", "·".dimmed(), "local, no key needed".dimmed())
    } else if settings.is_configured(spec.id) {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use marcia_core::ProviderId;
    use marcia_providers::ProviderRegistry;

    #[test]
    fn key_status_reflects_settings() {
        colored::control::set_override(false);
        let registry = ProviderRegistry::builtin();
        let mut settings = Settings::default();
        settings.set_api_key(ProviderId::Maritaca, "mk");

        let maritaca = registry.describe(ProviderId::Maritaca).unwrap();
        let openai = registry.describe(ProviderId::OpenAi).unwrap();
        let ollama = registry.describe(ProviderId::Ollama).unwrap();

        assert_eq!(key_status(maritaca, &settings), "✓ (key set)");
        assert_eq!(key_status(openai, &settings), "· not configured");
        assert!(key_status(ollama, &settings).contains("local"));
    }

    #[test]
    fn status_runs_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("missing.json")).is_ok());
    }
}
