//! Provider registry: the fixed set of provider configurations.
//!
//! [`PROVIDERS`] is the built-in table. A [`ProviderRegistry`] is an
//! immutable copy of such a table that gets handed to the gateway, so tests
//! (and settings) can point a provider at a different base URL.

use std::borrow::Cow;

use marcia_core::{ProviderId, UnknownProviderId, WireProtocol};

use crate::error::GatewayError;

// ─────────────────────────────────────────────
// ProviderDescriptor: metadata for one provider
// ─────────────────────────────────────────────

/// Display name, default endpoint and default model of one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    /// Human-readable name. E.g. `"Claude (Anthropic)"`.
    pub display_name: Cow<'static, str>,
    /// Base URL the request path is appended to. E.g. `"https://api.openai.com/v1"`.
    pub default_base_url: Cow<'static, str>,
    /// Model requested when the caller gives no override.
    pub default_model: Cow<'static, str>,
}

impl ProviderDescriptor {
    pub fn new(
        id: ProviderId,
        display_name: impl Into<Cow<'static, str>>,
        default_base_url: impl Into<Cow<'static, str>>,
        default_model: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            default_base_url: default_base_url.into(),
            default_model: default_model.into(),
        }
    }

    pub fn protocol(&self) -> WireProtocol {
        self.id.protocol()
    }

    pub fn is_local(&self) -> bool {
        self.id.is_local()
    }

    /// Same provider, different default base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.default_base_url = Cow::Owned(base_url.into());
        self
    }
}

// ─────────────────────────────────────────────
// Built-in providers
// ─────────────────────────────────────────────

/// Built-in provider table, in display order.
pub static PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: ProviderId::OpenAi,
        display_name: Cow::Borrowed("OpenAI (GPT)"),
        default_base_url: Cow::Borrowed("https://api.openai.com/v1"),
        default_model: Cow::Borrowed("gpt-4o"),
    },
    ProviderDescriptor {
        id: ProviderId::Gemini,
        display_name: Cow::Borrowed("Google Gemini"),
        default_base_url: Cow::Borrowed("https://generativelanguage.googleapis.com/v1beta"),
        default_model: Cow::Borrowed("gemini-2.5-flash"),
    },
    ProviderDescriptor {
        id: ProviderId::Claude,
        display_name: Cow::Borrowed("Claude (Anthropic)"),
        default_base_url: Cow::Borrowed("https://api.anthropic.com/v1"),
        default_model: Cow::Borrowed("claude-3-5-sonnet-20241022"),
    },
    // Maritaca: OpenAI-compatible, hosted
    ProviderDescriptor {
        id: ProviderId::Maritaca,
        display_name: Cow::Borrowed("Maritaca AI"),
        default_base_url: Cow::Borrowed("https://chat.maritaca.ai/api"),
        default_model: Cow::Borrowed("sabia-3.1"),
    },
    // Ollama: OpenAI-compatible, self-hosted, no API key
    ProviderDescriptor {
        id: ProviderId::Ollama,
        display_name: Cow::Borrowed("Ollama (Local)"),
        default_base_url: Cow::Borrowed("http://localhost:11434/v1"),
        default_model: Cow::Borrowed("gemma3:1b"),
    },
];

// ─────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────

/// Read-only lookup table handed to the dispatcher.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Build a registry. Fails if two descriptors share an id.
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self, GatewayError> {
        for (i, spec) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.id == spec.id) {
                return Err(GatewayError::DuplicateProvider(spec.id));
            }
        }
        Ok(Self { providers })
    }

    /// Registry over the built-in [`PROVIDERS`] table.
    pub fn builtin() -> Self {
        Self {
            providers: PROVIDERS.to_vec(),
        }
    }

    /// Look up a provider by id.
    pub fn describe(&self, id: ProviderId) -> Result<&ProviderDescriptor, GatewayError> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| UnknownProviderId(id.to_string()).into())
    }

    /// Look up a provider by its string id (e.g. `"maritaca"`).
    pub fn describe_name(&self, name: &str) -> Result<&ProviderDescriptor, GatewayError> {
        let id: ProviderId = name.parse()?;
        self.describe(id)
    }

    /// All providers, in display order.
    pub fn list(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Replace one provider's default base URL. Unknown ids are left alone.
    pub fn with_base_url(mut self, id: ProviderId, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if let Some(spec) = self.providers.iter_mut().find(|p| p.id == id) {
            *spec = spec.clone().with_base_url(base_url);
        }
        self
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_claude() {
        let registry = ProviderRegistry::builtin();
        let spec = registry.describe(ProviderId::Claude).unwrap();
        assert_eq!(spec.display_name, "Claude (Anthropic)");
        assert_eq!(spec.default_base_url, "https://api.anthropic.com/v1");
        assert_eq!(spec.default_model, "claude-3-5-sonnet-20241022");
        assert_eq!(spec.protocol(), WireProtocol::Anthropic);
    }

    #[test]
    fn test_describe_by_name() {
        let registry = ProviderRegistry::builtin();
        let spec = registry.describe_name("maritaca").unwrap();
        assert_eq!(spec.default_model, "sabia-3.1");
        assert_eq!(spec.protocol(), WireProtocol::OpenAiCompatible);
    }

    #[test]
    fn test_describe_unknown_name() {
        let registry = ProviderRegistry::builtin();
        let err = registry.describe_name("bard").unwrap_err();
        assert!(matches!(err, GatewayError::UnknownProvider(_)));
    }

    #[test]
    fn test_describe_missing_from_custom_registry() {
        let registry = ProviderRegistry::new(vec![PROVIDERS[0].clone()]).unwrap();
        let err = registry.describe(ProviderId::Ollama).unwrap_err();
        assert!(matches!(err, GatewayError::UnknownProvider(UnknownProviderId(ref s)) if s == "ollama"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ProviderRegistry::new(vec![PROVIDERS[1].clone(), PROVIDERS[1].clone()])
            .unwrap_err();
        assert!(matches!(err, GatewayError::DuplicateProvider(ProviderId::Gemini)));
    }

    #[test]
    fn test_with_base_url_substitutes_one_provider() {
        let registry =
            ProviderRegistry::builtin().with_base_url(ProviderId::OpenAi, "http://127.0.0.1:9999");
        assert_eq!(
            registry.describe(ProviderId::OpenAi).unwrap().default_base_url,
            "http://127.0.0.1:9999"
        );
        assert_eq!(
            registry.describe(ProviderId::Maritaca).unwrap().default_base_url,
            "https://chat.maritaca.ai/api"
        );
    }

    #[test]
    fn test_only_ollama_is_local() {
        let locals: Vec<_> = PROVIDERS.iter().filter(|p| p.is_local()).map(|p| p.id).collect();
        assert_eq!(locals, vec![ProviderId::Ollama]);
    }

    #[test]
    fn test_all_providers_have_unique_ids() {
        assert!(ProviderRegistry::new(PROVIDERS.to_vec()).is_ok());
    }

    #[test]
    fn test_builtin_covers_every_provider_id() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.list().len(), ProviderId::ALL.len());
        for id in ProviderId::ALL {
            assert!(registry.describe(id).is_ok());
        }
    }
}
