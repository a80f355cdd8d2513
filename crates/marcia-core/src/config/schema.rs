//! Settings schema: what the desktop app keeps in `settings.json`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::ProviderId;

/// Default self-hosted endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";

/// Default deadline around each network call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Root settings: loaded from `~/.marcia/settings.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Selected provider id (`"claude"`, `"openai"`, …).
    pub ai_provider: String,
    /// API key per provider id.
    pub api_keys: BTreeMap<String, String>,
    /// Base URL of the self-hosted endpoint.
    pub ollama_url: String,
    /// Model to request from the self-hosted endpoint.
    pub ollama_model: String,
    /// UI locale (e.g. `"pt-BR"`).
    pub selected_locale: String,
    /// Route every request through this HTTP proxy (sandboxed environments).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Deadline the front end puts around each network call.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let api_keys = ProviderId::ALL
            .into_iter()
            .filter(|id| id.requires_credential())
            .map(|id| (id.as_str().to_string(), String::new()))
            .collect();

        Self {
            ai_provider: ProviderId::Claude.as_str().to_string(),
            api_keys,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: "llama2".to_string(),
            selected_locale: "pt-BR".to_string(),
            proxy_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// The selected provider, if `ai_provider` names a supported one.
    pub fn provider(&self) -> Result<ProviderId, crate::types::UnknownProviderId> {
        self.ai_provider.parse()
    }

    /// The stored API key for a provider, if one is set.
    pub fn api_key(&self, provider: ProviderId) -> Option<&str> {
        self.api_keys
            .get(provider.as_str())
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }

    /// Store (or replace) the API key for a provider.
    pub fn set_api_key(&mut self, provider: ProviderId, key: impl Into<String>) {
        self.api_keys.insert(provider.as_str().to_string(), key.into());
    }

    /// Whether a provider can be used with the current settings.
    pub fn is_configured(&self, provider: ProviderId) -> bool {
        !provider.requires_credential() || self.api_key(provider).is_some()
    }

    /// The proxy URL, if set and not blank.
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
