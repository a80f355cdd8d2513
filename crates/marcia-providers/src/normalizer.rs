//! Response normalizer: from a provider envelope to an [`AnalysisResult`].
//!
//! Three steps, each a pure function:
//! 1. [`extract_text`] pulls the model's free-text answer out of the envelope.
//! 2. [`strip_code_fences`] removes markdown fences models like to add.
//! 3. [`parse_structured`] parses and validates the JSON verdict.

use serde_json::{Map, Value};

use marcia_core::{AnalysisResult, WireProtocol};

use crate::error::GatewayError;
use crate::wire::{ChatCompletionResponse, GenerateContentResponse, MessagesResponse};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

const MAX_SCORE: u64 = 100;

/// Extract the answer text from a provider envelope.
///
/// - OpenAI-compatible: `choices[0].message.content`
/// - Gemini: `candidates[0].content.parts[0].text`
/// - Anthropic: `content[0].text`
///
/// Returns `None` if the path is missing, not a string, or blank.
pub fn extract_text(protocol: WireProtocol, raw: Value) -> Option<String> {
    let text = match protocol {
        WireProtocol::OpenAiCompatible => serde_json::from_value::<ChatCompletionResponse>(raw)
            .ok()?
            .choices
            .into_iter()
            .next()?
            .message
            .content,
        WireProtocol::Gemini => serde_json::from_value::<GenerateContentResponse>(raw)
            .ok()?
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()?
            .text,
        WireProtocol::Anthropic => serde_json::from_value::<MessagesResponse>(raw)
            .ok()?
            .content
            .into_iter()
            .next()?
            .text,
    }?;

    (!text.trim().is_empty()).then_some(text)
}

/// Remove markdown code-fence markers around an embedded payload.
///
/// Trims the text, then (only if a fence is present) deletes every
/// ```` ```json ```` marker and every bare ```` ``` ```` marker, each with one
/// following newline, and trims again.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains(FENCE) {
        return trimmed.to_string();
    }

    let without_tagged = remove_marker(trimmed, JSON_FENCE);
    remove_marker(&without_tagged, FENCE).trim().to_string()
}

fn remove_marker(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + marker.len()..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    out.push_str(rest);
    out
}

/// Parse the model's answer into a validated [`AnalysisResult`].
///
/// Fails with `MalformedResponse` if the (fence-stripped) text is not JSON,
/// and with `SchemaViolation` if it is JSON of the wrong shape.
pub fn parse_structured(text: &str) -> Result<AnalysisResult, GatewayError> {
    let cleaned = strip_code_fences(text);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|source| GatewayError::MalformedResponse {
            raw_text: text.to_string(),
            source,
        })?;
    validate(value)
}

fn validate(value: Value) -> Result<AnalysisResult, GatewayError> {
    let Value::Object(obj) = value else {
        return Err(GatewayError::SchemaViolation(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    };

    Ok(AnalysisResult {
        score: score_field(&obj)?,
        category: string_field(&obj, "category")?,
        judgment: string_field(&obj, "judgment")?,
        advice: string_field(&obj, "advice")?,
    })
}

fn score_field(obj: &Map<String, Value>) -> Result<u8, GatewayError> {
    let n = match obj.get("score") {
        None => return Err(missing("score")),
        Some(Value::Number(n)) => n,
        Some(other) => {
            return Err(GatewayError::SchemaViolation(format!(
                "`score` must be a number, got {}",
                kind(other)
            )))
        }
    };

    // Integral floats (e.g. `42.0`) count as integers.
    let score = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= MAX_SCORE as f64)
            .map(|f| f as u64)
    });

    match score {
        Some(s) if s <= MAX_SCORE => Ok(s as u8),
        _ => Err(GatewayError::SchemaViolation(format!(
            "`score` must be an integer between 0 and {MAX_SCORE}, got {n}"
        ))),
    }
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Result<String, GatewayError> {
    match obj.get(field) {
        None => Err(missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(GatewayError::SchemaViolation(format!(
            "`{field}` must be a string, got {}",
            kind(other)
        ))),
    }
}

fn missing(field: &str) -> GatewayError {
    GatewayError::SchemaViolation(format!("missing field `{field}`"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VERDICT: &str = r#"{"score":42,"category":"Queixa razoável","judgment":"Chato, mas passa.","advice":"Respira e segue."}"#;

    fn verdict() -> AnalysisResult {
        AnalysisResult {
            score: 42,
            category: "Queixa razoável".into(),
            judgment: "Chato, mas passa.".into(),
            advice: "Respira e segue.".into(),
        }
    }

    // ── extract_text ──

    #[test]
    fn test_extract_openai() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{ "message": { "role": "assistant", "content": "hello" }, "finish_reason": "stop" }]
        });
        assert_eq!(
            extract_text(WireProtocol::OpenAiCompatible, raw).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_extract_gemini() {
        let raw = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "oi" }, { "text": "ignored" }] } }]
        });
        assert_eq!(extract_text(WireProtocol::Gemini, raw).as_deref(), Some("oi"));
    }

    #[test]
    fn test_extract_anthropic() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "content": [{ "type": "text", "text": "olá" }],
            "stop_reason": "end_turn"
        });
        assert_eq!(extract_text(WireProtocol::Anthropic, raw).as_deref(), Some("olá"));
    }

    #[test]
    fn test_extract_missing_paths() {
        assert_eq!(extract_text(WireProtocol::OpenAiCompatible, json!({ "choices": [] })), None);
        assert_eq!(
            extract_text(WireProtocol::OpenAiCompatible, json!({ "choices": [{ "message": { "content": null } }] })),
            None
        );
        assert_eq!(extract_text(WireProtocol::Gemini, json!({ "candidates": [{}] })), None);
        assert_eq!(extract_text(WireProtocol::Anthropic, json!({})), None);
    }

    #[test]
    fn test_extract_blank_or_mistyped_is_none() {
        assert_eq!(
            extract_text(WireProtocol::Anthropic, json!({ "content": [{ "text": "   " }] })),
            None
        );
        assert_eq!(
            extract_text(WireProtocol::Anthropic, json!({ "content": [{ "text": 7 }] })),
            None
        );
        assert_eq!(extract_text(WireProtocol::Gemini, json!("just a string")), None);
    }

    #[test]
    fn test_extract_uses_protocol_not_shape() {
        // An Anthropic-shaped body read as OpenAI yields nothing.
        let raw = json!({ "content": [{ "text": "olá" }] });
        assert_eq!(extract_text(WireProtocol::OpenAiCompatible, raw), None);
    }

    // ── strip_code_fences ──

    #[test]
    fn test_strip_no_fence() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_json_tagged_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_untagged_fence() {
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_nested_fences() {
        let text = "```json\n```json\n{\"a\":1}\n```\n```";
        assert_eq!(strip_code_fences(text), "{\"a\":1}");
    }

    #[test]
    fn test_strip_fence_without_newlines() {
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_keeps_inner_text_around_fences() {
        let text = "Aqui está:\n```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(text), "Aqui está:\n{\"a\":1}");
    }

    // ── parse_structured ──

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_structured(VERDICT).unwrap(), verdict());
    }

    #[test]
    fn test_parse_fenced_equals_plain() {
        let fenced = format!("```json\n{VERDICT}\n```");
        assert_eq!(parse_structured(&fenced).unwrap(), parse_structured(VERDICT).unwrap());
    }

    #[test]
    fn test_parse_roundtrip() {
        let original = AnalysisResult {
            score: 100,
            category: "Pico da mesquinhez".into(),
            judgment: "Reclamar do \"bom dia\" alheio?".into(),
            advice: "Nem todo mundo vai te agradar!\nSegue o baile.".into(),
        };
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(parse_structured(&json).unwrap(), original);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let text = r#"{"score":0,"category":"c","judgment":"j","advice":"a","emoji":"🙂"}"#;
        assert_eq!(parse_structured(text).unwrap().score, 0);
    }

    #[test]
    fn test_parse_integral_float_score() {
        let text = r#"{"score":73.0,"category":"c","judgment":"j","advice":"a"}"#;
        assert_eq!(parse_structured(text).unwrap().score, 73);
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_structured("Desculpe, não consigo avaliar isso.").unwrap_err();
        match err {
            GatewayError::MalformedResponse { raw_text, .. } => {
                assert_eq!(raw_text, "Desculpe, não consigo avaliar isso.");
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_numeric_score() {
        let text = r#"{"score":"high","category":"c","judgment":"j","advice":"a"}"#;
        let err = parse_structured(text).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaViolation(ref m) if m.contains("score")));
    }

    #[test]
    fn test_parse_score_out_of_range() {
        for score in ["101", "-1", "42.5", "1e3"] {
            let text = format!(r#"{{"score":{score},"category":"c","judgment":"j","advice":"a"}}"#);
            let err = parse_structured(&text).unwrap_err();
            assert!(
                matches!(err, GatewayError::SchemaViolation(_)),
                "score {score} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_missing_field() {
        let text = r#"{"score":10,"category":"c","judgment":"j"}"#;
        let err = parse_structured(text).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaViolation(ref m) if m.contains("advice")));
    }

    #[test]
    fn test_parse_mistyped_field() {
        let text = r#"{"score":10,"category":["c"],"judgment":"j","advice":"a"}"#;
        let err = parse_structured(text).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaViolation(ref m) if m.contains("category")));
    }

    #[test]
    fn test_parse_not_an_object() {
        let err = parse_structured("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, GatewayError::SchemaViolation(ref m) if m.contains("array")));
    }
}
