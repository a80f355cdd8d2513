//! `marcia onboard`: create the settings file and store an API key.
//!
//! - Creates `~/.marcia/settings.json` with defaults if missing
//! - `--provider` makes a provider active
//! - `--api-key` stores the key for that provider (or the active one)

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use marcia_core::config::{load_settings, save_settings, Settings};
use marcia_core::ProviderId;

/// Run the onboard command.
pub fn run(settings_path: &Path, provider: Option<&str>, api_key: Option<&str>) -> Result<()> {
    println!();
    println!("{}", "⚖️  M.A.R.C.I.A Setup".cyan().bold());
    println!();

    let existed = settings_path.exists();
    let settings = load_settings(Some(settings_path));
    let settings = apply_choices(settings, provider, api_key)?;

    save_settings(&settings, Some(settings_path))?;
    println!(
        "  {} {} settings at {}",
        "✓".green(),
        if existed { "updated" } else { "created" },
        settings_path.display()
    );

    let active = settings.provider()?;
    println!("  {} active provider: {}", "✓".green(), active);
    if active.requires_credential() && !settings.is_configured(active) {
        println!(
            "  {} no API key for {}; pass --api-key to store one",
            "!".yellow(),
            active
        );
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Run `marcia analyze` to start.".green()
    );
    println!();

    Ok(())
}

/// Apply the command-line choices to loaded settings.
fn apply_choices(
    mut settings: Settings,
    provider: Option<&str>,
    api_key: Option<&str>,
) -> Result<Settings> {
    let target = match provider {
        Some(name) => {
            let id: ProviderId = name.parse()?;
            settings.ai_provider = id.as_str().to_string();
            id
        }
        None => settings.provider()?,
    };

    if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
        if !target.requires_credential() {
            bail!("{target} runs locally and does not use an API key");
        }
        settings.set_api_key(target, key);
    }

    Ok(settings)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
