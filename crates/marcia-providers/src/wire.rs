//! Request bodies and response envelopes of the three wire protocols.
//!
//! Response types are lenient (`#[serde(default)]` everywhere):
//! a missing field means "no answer", which the normalizer reports as an
//! empty response rather than a decoding failure.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Shared
// ─────────────────────────────────────────────

/// A single-turn user message, shared by the OpenAI and Anthropic shapes.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserMessage {
    pub role: &'static str,
    pub content: String,
}

impl UserMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// OpenAI-compatible chat completions
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<UserMessage>,
    pub temperature: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

// ─────────────────────────────────────────────
// Gemini generateContent
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
}

impl GenerateContentRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(text.into()),
                }],
            }],
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateContentResponse {
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

// ─────────────────────────────────────────────
// Anthropic messages
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<UserMessage>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessagesResponse {
    pub content: Vec<AnthropicBlock>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnthropicBlock {
    pub text: Option<String>,
}
