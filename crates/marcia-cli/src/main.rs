//! M.A.R.C.I.A CLI entry point.
//!
//! # Commands
//!
//! - `marcia analyze [TEXT]`: score a grievance (single-shot or REPL)
//! - `marcia models`: list the models the self-hosted endpoint offers
//! - `marcia providers`: list the supported providers and key status
//! - `marcia status`: show the active settings
//! - `marcia onboard`: create the settings file, optionally storing a key

mod helpers;
mod models;
mod onboard;
mod repl;
mod status;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use marcia_core::config::{get_settings_path, load_settings, Settings};
use marcia_core::{AnalysisRequest, AnalysisResult, ProviderId};
use marcia_providers::{build_transport, Gateway, ProviderRegistry};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// ⚖️ M.A.R.C.I.A: how petty is your grievance, really?
#[derive(Parser)]
#[command(name = "marcia", version, about, long_about = None)]
struct Cli {
    /// Settings file to use instead of ~/.marcia/settings.json
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a grievance (single-shot, or interactive when TEXT is omitted)
    Analyze {
        /// The grievance. Omit for REPL mode.
        text: Option<String>,

        #[command(flatten)]
        target: TargetArgs,

        /// Print the raw verdict as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// List the models a self-hosted endpoint offers
    Models {
        /// Endpoint to query (defaults to the configured Ollama URL)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// List the supported providers
    Providers,

    /// Show the active settings
    Status,

    /// Create the settings file and optionally store an API key
    Onboard {
        /// Provider to make active
        #[arg(short, long)]
        provider: Option<String>,

        /// API key for that provider
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Per-invocation overrides of the configured provider.
#[derive(Args, Clone, Default)]
struct TargetArgs {
    /// Provider to use (openai, gemini, claude, maritaca, ollama)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use instead of the provider default
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint to use instead of the provider default
    #[arg(short, long)]
    endpoint: Option<String>,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_path = cli
        .settings
        .as_deref()
        .map(helpers::expand_tilde)
        .unwrap_or_else(get_settings_path);

    match cli.command {
        Commands::Analyze {
            text,
            target,
            json,
            logs,
        } => {
            init_logging(logs);
            let settings = load_settings(Some(settings_path.as_path()));
            run_analyze(&settings, text, target, json).await
        }
        Commands::Models { endpoint, logs } => {
            init_logging(logs);
            let settings = load_settings(Some(settings_path.as_path()));
            models::run(&settings, endpoint).await
        }
        Commands::Providers => {
            let settings = load_settings(Some(settings_path.as_path()));
            status::providers(&settings)
        }
        Commands::Status => status::run(&settings_path),
        Commands::Onboard { provider, api_key } => {
            onboard::run(&settings_path, provider.as_deref(), api_key.as_deref())
        }
    }
}

// ─────────────────────────────────────────────
// Analyze command
// ─────────────────────────────────────────────

async fn run_analyze(
    settings: &Settings,
    text: Option<String>,
    target: TargetArgs,
    as_json: bool,
) -> Result<()> {
    let gateway = build_gateway(settings)?;
    let timeout = Duration::from_secs(settings.request_timeout_secs);

    match text {
        Some(text) => {
            let request = build_request(settings, &text, &target)?;
            info!(provider = %request.provider, "analyzing single grievance");
            match analyze(&gateway, &request, timeout).await {
                Ok(result) => helpers::print_verdict(&result, as_json)?,
                Err(e) => {
                    helpers::print_error(&e);
                    return Err(e);
                }
            }
        }
        None => {
            repl::run(&gateway, settings, &target, timeout, as_json).await?;
        }
    }

    Ok(())
}

/// Build the gateway over the built-in registry and the configured transport.
pub fn build_gateway(settings: &Settings) -> Result<Gateway> {
    let transport = build_transport(settings.proxy_url()).context("failed to build HTTP transport")?;
    debug!(transport = transport.name(), "transport ready");
    Ok(Gateway::new(Arc::new(ProviderRegistry::builtin()), transport))
}

/// Turn the settings plus command-line overrides into an analysis request.
fn build_request(settings: &Settings, text: &str, target: &TargetArgs) -> Result<AnalysisRequest> {
    let provider = match target.provider.as_deref() {
        Some(name) => name.parse::<ProviderId>()?,
        None => settings.provider()?,
    };

    let mut request = AnalysisRequest::new(text, provider);
    if let Some(key) = settings.api_key(provider) {
        request = request.with_credential(key);
    }

    // The self-hosted provider takes its endpoint and model from settings.
    if provider.is_local() {
        request = request
            .with_endpoint(settings.ollama_url.as_str())
            .with_model(settings.ollama_model.as_str());
    }
    if let Some(endpoint) = &target.endpoint {
        request = request.with_endpoint(endpoint.as_str());
    }
    if let Some(model) = &target.model {
        request = request.with_model(model.as_str());
    }

    Ok(request)
}

/// Run one analysis, bounded by the configured timeout.
async fn analyze(
    gateway: &Gateway,
    request: &AnalysisRequest,
    timeout: Duration,
) -> Result<AnalysisResult> {
    match tokio::time::timeout(timeout, gateway.analyze(request)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(anyhow!(
            "{} did not answer within {}s",
            request.provider,
            timeout.as_secs()
        )),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("marcia=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
