//! `marcia models`: list the models a self-hosted endpoint offers.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use marcia_core::config::Settings;

use crate::build_gateway;

/// Run the models command.
pub async fn run(settings: &Settings, endpoint: Option<String>) -> Result<()> {
    let endpoint = endpoint.unwrap_or_else(|| settings.ollama_url.clone());
    let gateway = build_gateway(settings)?;
    let timeout = Duration::from_secs(settings.request_timeout_secs);

    let models = tokio::time::timeout(timeout, gateway.list_discovered_models(&endpoint))
        .await
        .unwrap_or_default();

    println!();
    println!("{} {}", "Models at".bold(), endpoint.cyan());
    println!();

    if models.is_empty() {
        println!(
            "  {}",
            "· could not list models; type the model name with `marcia analyze -m <model>`"
                .dimmed()
        );
    } else {
        for name in &models {
            let marker = if *name == settings.ollama_model {
                "✓".green().to_string()
            } else {
                " ".to_string()
            };
            println!("  {marker} {name}");
        }
    }
    println!();

    Ok(())
}
