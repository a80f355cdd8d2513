//! Model discovery for the self-hosted provider.
//!
//! Two tiers, tried in order:
//! 1. `GET {root}/api/tags`: Ollama's native listing (`models[].name`)
//! 2. `GET {root}/v1/models`: OpenAI-compatible listing (`data[].id`)
//!
//! When both fail the result is an empty list, never an error: the caller
//! simply falls back to free-text model entry.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::transport::{HttpRequest, HttpTransport};

const API_VERSION_SEGMENT: &str = "/v1";

/// `{ "models": [ { "name": … }, … ] }`
#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<Value>,
}

/// `{ "data": [ { "id": … }, … ] }`
#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<Value>,
}

/// The two listing URLs for a user-entered endpoint: `(native, openai_compatible)`.
pub fn discovery_urls(endpoint: &str) -> (String, String) {
    let trimmed = endpoint.trim();
    let base = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let root = base.strip_suffix(API_VERSION_SEGMENT).unwrap_or(base);

    let v1 = if base.ends_with(API_VERSION_SEGMENT) {
        base.to_string()
    } else {
        format!("{base}{API_VERSION_SEGMENT}")
    };

    (format!("{root}/api/tags"), format!("{v1}/models"))
}

/// Lists the models a self-hosted endpoint offers.
pub struct ModelDiscovery {
    transport: Arc<dyn HttpTransport>,
}

impl ModelDiscovery {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Model names in the order the host returned them; empty if unavailable.
    pub async fn discover(&self, endpoint: &str) -> Vec<String> {
        let (tags_url, models_url) = discovery_urls(endpoint);

        if let Some(names) = self.fetch_list::<TagsResponse>(&tags_url).await {
            let names = collect_strings(names.models, "name");
            debug!(url = %tags_url, count = names.len(), "listed models via native endpoint");
            return names;
        }

        if let Some(list) = self.fetch_list::<ModelsResponse>(&models_url).await {
            let ids = collect_strings(list.data, "id");
            debug!(url = %models_url, count = ids.len(), "listed models via OpenAI-compatible endpoint");
            return ids;
        }

        warn!(endpoint = endpoint, "could not list models from either endpoint");
        Vec::new()
    }

    async fn fetch_list<T: serde::de::DeserializeOwned>(&self, url: &str) -> Option<T> {
        let response = match self.transport.send(HttpRequest::get(url)).await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = url, error = %e, "model listing request failed");
                return None;
            }
        };

        if !response.is_success() {
            debug!(url = url, status = response.status, "model listing returned an error status");
            return None;
        }

        match response.json::<T>() {
            Ok(list) => Some(list),
            Err(e) => {
                debug!(url = url, error = %e, "model listing body not understood");
                None
            }
        }
    }
}

fn collect_strings(entries: Vec<Value>, field: &str) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.get(field)?.as_str().map(String::from))
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
