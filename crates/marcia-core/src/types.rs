//! Core types for M.A.R.C.I.A: provider identity, wire protocol families,
//! and the analysis request/result pair exchanged with the gateway.
//!
//! Provider *identity* (five named configs) and *wire protocol* (three
//! request/response shapes) are kept as separate enums: the protocol, not the
//! provider name, decides how a request is built and a response is read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────
// Provider identity
// ─────────────────────────────────────────────

/// One of the fixed set of supported provider configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Hosted OpenAI.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini (AI Studio).
    Gemini,
    /// Anthropic Claude.
    Claude,
    /// Maritaca AI (OpenAI-compatible, hosted).
    Maritaca,
    /// Self-hosted Ollama, reached through its OpenAI-compatible API.
    Ollama,
}

impl ProviderId {
    /// Every provider, in display order.
    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAi,
        ProviderId::Gemini,
        ProviderId::Claude,
        ProviderId::Maritaca,
        ProviderId::Ollama,
    ];

    /// Stable string identifier (`"openai"`, `"gemini"`, …).
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Claude => "claude",
            ProviderId::Maritaca => "maritaca",
            ProviderId::Ollama => "ollama",
        }
    }

    /// The request/response shape family this provider speaks.
    pub fn protocol(self) -> WireProtocol {
        match self {
            ProviderId::OpenAi | ProviderId::Maritaca | ProviderId::Ollama => {
                WireProtocol::OpenAiCompatible
            }
            ProviderId::Gemini => WireProtocol::Gemini,
            ProviderId::Claude => WireProtocol::Anthropic,
        }
    }

    /// Whether this is the local/self-hosted variant (no credential, no auth header).
    pub fn is_local(self) -> bool {
        matches!(self, ProviderId::Ollama)
    }

    /// Whether an API key must be supplied before any request is sent.
    pub fn requires_credential(self) -> bool {
        !self.is_local()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a supported provider.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown provider '{0}'")]
pub struct UnknownProviderId(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProviderId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == lower)
            .ok_or_else(|| UnknownProviderId(s.to_string()))
    }
}

/// HTTP request/response shape family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireProtocol {
    /// `POST {base}/chat/completions` with Bearer auth.
    OpenAiCompatible,
    /// `POST {base}/models/{model}:generateContent?key=…`.
    Gemini,
    /// `POST {base}/messages` with `x-api-key`.
    Anthropic,
}

impl fmt::Display for WireProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireProtocol::OpenAiCompatible => "openai-compatible",
            WireProtocol::Gemini => "gemini",
            WireProtocol::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────
// Analysis request / result
// ─────────────────────────────────────────────

/// A single grievance to be scored, plus the connection details for one call.
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    /// The grievance text. Must not be blank.
    pub text: String,
    /// Which provider configuration to use.
    pub provider: ProviderId,
    /// API key. Required for every provider except the local one.
    pub credential: Option<String>,
    /// Replaces the provider's default base URL.
    pub endpoint_override: Option<String>,
    /// Replaces the provider's default model.
    pub model_override: Option<String>,
}

impl AnalysisRequest {
    /// Create a request with no credential or overrides.
    pub fn new(text: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            text: text.into(),
            provider,
            credential: None,
            endpoint_override: None,
            model_override: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    /// The credential, if present and not blank.
    pub fn credential(&self) -> Option<&str> {
        non_blank(self.credential.as_deref())
    }

    /// The endpoint override, if present and not blank.
    pub fn endpoint_override(&self) -> Option<&str> {
        non_blank(self.endpoint_override.as_deref())
    }

    /// The model override, if present and not blank.
    pub fn model_override(&self) -> Option<&str> {
        non_blank(self.model_override.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The normalized verdict returned by a successful analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Pettiness score, 0 (legitimate) to 100 (peak pettiness).
    pub score: u8,
    pub category: String,
    pub judgment: String,
    pub advice: String,
}

impl AnalysisResult {
    /// Which pettiness band the score falls into.
    pub fn band(&self) -> PettinessBand {
        PettinessBand::from_score(self.score)
    }
}

// ─────────────────────────────────────────────
// Pettiness bands
// ─────────────────────────────────────────────

/// The five score ranges the model is asked to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PettinessBand {
    /// 0–20
    Legitimate,
    /// 21–40
    Reasonable,
    /// 41–60
    GettingPetty,
    /// 61–80
    QuitePetty,
    /// 81–100
    PeakPettiness,
}

impl PettinessBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => PettinessBand::Legitimate,
            21..=40 => PettinessBand::Reasonable,
            41..=60 => PettinessBand::GettingPetty,
            61..=80 => PettinessBand::QuitePetty,
            _ => PettinessBand::PeakPettiness,
        }
    }

    /// Short label shown next to the gauge.
    pub fn label(self) -> &'static str {
        match self {
            PettinessBand::Legitimate => "Preocupação legítima",
            PettinessBand::Reasonable => "Queixa razoável",
            PettinessBand::GettingPetty => "Começando a ficar mesquinho",
            PettinessBand::QuitePetty => "Bem mesquinho",
            PettinessBand::PeakPettiness => "Pico da mesquinhez",
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
