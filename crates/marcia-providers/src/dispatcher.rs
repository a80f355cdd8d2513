//! Request dispatcher: turns an [`AnalysisRequest`] into the provider's
//! HTTP request and sends it through the injected transport.
//!
//! | Protocol | Endpoint | Auth |
//! |---|---|---|
//! | OpenAI-compatible | `POST {base}/chat/completions` | `Authorization: Bearer` (none for the local provider) |
//! | Gemini | `POST {base}/models/{model}:generateContent?key=…` | form-encoded query parameter |
//! | Anthropic | `POST {base}/messages` | `x-api-key` + `anthropic-version` |
//!
//! One attempt per call. A non-2xx status becomes `ProviderHttp`; the body is
//! logged but not carried in the error.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use tracing::{debug, error};

use marcia_core::{AnalysisRequest, ProviderId, WireProtocol};

use crate::error::{GatewayError, ValidationError};
use crate::prompt::build_prompt;
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::transport::{HttpRequest, HttpTransport};
use crate::wire::{ChatCompletionRequest, GenerateContentRequest, MessagesRequest, UserMessage};

/// API version pinned in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// `max_tokens` sent to Anthropic (the field is mandatory there).
pub const ANTHROPIC_MAX_TOKENS: u32 = 1024;
/// `temperature` sent to OpenAI-compatible providers.
pub const CHAT_TEMPERATURE: u32 = 1;

const API_VERSION_SEGMENT: &str = "/v1";

// ─────────────────────────────────────────────
// URL / model resolution
// ─────────────────────────────────────────────

/// Effective base URL: the override (or the provider default) with one
/// trailing slash removed; the local provider also gets `/v1` ensured.
pub fn resolve_base_url(spec: &ProviderDescriptor, endpoint_override: Option<&str>) -> String {
    let base = endpoint_override.unwrap_or(spec.default_base_url.as_ref());
    let base = base.strip_suffix('/').unwrap_or(base);

    if spec.is_local() && !base.ends_with(API_VERSION_SEGMENT) {
        format!("{base}{API_VERSION_SEGMENT}")
    } else {
        base.to_string()
    }
}

/// Effective model: the override, or the provider default.
pub fn resolve_model(spec: &ProviderDescriptor, model_override: Option<&str>) -> String {
    model_override
        .unwrap_or(spec.default_model.as_ref())
        .to_string()
}

// ─────────────────────────────────────────────
// Request building
// ─────────────────────────────────────────────

/// Build the provider-specific HTTP request for one grievance.
///
/// Pure: no I/O. Fails only if a required credential is missing or cannot
/// be placed in a header.
pub fn build_request(
    spec: &ProviderDescriptor,
    request: &AnalysisRequest,
    prompt: &str,
) -> Result<HttpRequest, GatewayError> {
    let base = resolve_base_url(spec, request.endpoint_override());
    let model = resolve_model(spec, request.model_override());

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http_request = match spec.protocol() {
        WireProtocol::OpenAiCompatible => {
            if !spec.is_local() {
                let key = require_credential(spec.id, request)?;
                headers.insert(AUTHORIZATION, header_value(spec.id, &format!("Bearer {key}"))?);
            }
            let body = ChatCompletionRequest {
                model,
                messages: vec![UserMessage::new(prompt)],
                temperature: CHAT_TEMPERATURE,
            };
            HttpRequest::post_json(format!("{base}/chat/completions"), headers, to_json(&body))
        }
        WireProtocol::Gemini => {
            let key = require_credential(spec.id, request)?;
            let url = gemini_url(spec.id, &base, &model, key)?;
            let body = GenerateContentRequest::from_text(prompt);
            HttpRequest::post_json(url, headers, to_json(&body))
        }
        WireProtocol::Anthropic => {
            let key = require_credential(spec.id, request)?;
            headers.insert(HeaderName::from_static("x-api-key"), header_value(spec.id, key)?);
            headers.insert(
                HeaderName::from_static("anthropic-version"),
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
            let body = MessagesRequest {
                model,
                max_tokens: ANTHROPIC_MAX_TOKENS,
                messages: vec![UserMessage::new(prompt)],
            };
            HttpRequest::post_json(format!("{base}/messages"), headers, to_json(&body))
        }
    };

    Ok(http_request)
}

fn require_credential(
    provider: ProviderId,
    request: &AnalysisRequest,
) -> Result<&str, ValidationError> {
    request
        .credential()
        .ok_or(ValidationError::MissingCredential(provider))
}

/// `{base}/models/{model}:generateContent?key=…` with the key form-encoded.
fn gemini_url(
    provider: ProviderId,
    base: &str,
    model: &str,
    key: &str,
) -> Result<String, ValidationError> {
    if key.chars().any(char::is_control) {
        return Err(ValidationError::InvalidCredential(provider));
    }
    let mut url = Url::parse(&format!("{base}/models/{model}:generateContent"))
        .map_err(|_| ValidationError::InvalidEndpoint(base.to_string()))?;
    url.query_pairs_mut().append_pair("key", key);
    Ok(url.into())
}

fn header_value(provider: ProviderId, value: &str) -> Result<HeaderValue, ValidationError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidCredential(provider))?;
    value.set_sensitive(true);
    Ok(value)
}

fn to_json<T: serde::Serialize>(body: &T) -> serde_json::Value {
    // Wire request types are plain structs of strings and integers.
    serde_json::to_value(body).unwrap_or_default()
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Decoded JSON body of a successful provider response.
#[derive(Clone, Debug)]
pub struct RawProviderResponse {
    pub provider: ProviderId,
    pub protocol: WireProtocol,
    pub body: serde_json::Value,
}

/// Builds and sends provider requests. Holds no mutable state.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.registry.list().len())
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Send one analysis request and return the decoded response body.
    pub async fn dispatch(
        &self,
        request: &AnalysisRequest,
    ) -> Result<RawProviderResponse, GatewayError> {
        let spec = self.registry.describe(request.provider)?;
        let prompt = build_prompt(&request.text);
        let http_request = build_request(spec, request, &prompt)?;

        debug!(
            provider = %spec.id,
            model = %resolve_model(spec, request.model_override()),
            url = http_request.redacted_url(),
            transport = self.transport.name(),
            "Calling provider"
        );

        let response = self.transport.send(http_request).await?;

        if !response.is_success() {
            error!(
                provider = %spec.id,
                status = response.status,
                body = %response.text(),
                "API error"
            );
            return Err(GatewayError::ProviderHttp {
                provider: spec.id,
                status: response.status,
                status_text: response.status_text,
            });
        }

        let body = response.json::<serde_json::Value>().map_err(|source| {
            error!(provider = %spec.id, error = %source, "Response body is not JSON");
            GatewayError::MalformedResponse {
                raw_text: response.text(),
                source,
            }
        })?;

        debug!(provider = %spec.id, status = response.status, "Provider response received");

        Ok(RawProviderResponse {
            provider: spec.id,
            protocol: spec.protocol(),
            body,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
