//! Settings loader: reads `~/.marcia/settings.json`, merges env vars, and
//! migrates files written by the desktop app.
//!
//! # Loading precedence
//! 1. Defaults (from `Settings::default()`)
//! 2. JSON file at `~/.marcia/settings.json`
//! 3. Environment variables `MARCIA_<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Settings, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Default settings file path.
pub fn get_settings_path() -> PathBuf {
    crate::utils::get_data_path().join("settings.json")
}

/// Load settings from the default path (or `path`) + env vars.
///
/// Falls back to `Settings::default()` if the file doesn't exist or can't be parsed.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let settings_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_settings_path);

    let settings = load_settings_from_path(&settings_path);
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Load settings from a specific file path, without env overrides.
fn load_settings_from_path(path: &Path) -> Settings {
    if !path.exists() {
        info!("No settings file found at {}, using defaults", path.display());
        return Settings::default();
    }

    debug!("Loading settings from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read settings file {}: {}", path.display(), e);
            return Settings::default();
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse settings JSON: {}", e);
            return Settings::default();
        }
    };

    migrate_settings(&mut raw);

    match serde_json::from_value::<Settings>(raw) {
        Ok(mut s) => {
            if s.request_timeout_secs == 0 {
                warn!(
                    "Ignoring requestTimeoutSecs = 0, using {}s",
                    DEFAULT_REQUEST_TIMEOUT_SECS
                );
                s.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
            }
            s
        }
        Err(e) => {
            warn!("Failed to deserialize settings: {}", e);
            Settings::default()
        }
    }
}

/// Save settings to disk (pretty-printed JSON with camelCase keys).
pub fn save_settings(settings: &Settings, path: Option<&Path>) -> std::io::Result<()> {
    let settings_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_settings_path);

    if let Some(parent) = settings_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;

    std::fs::write(&settings_path, json)?;
    debug!("Settings saved to {}", settings_path.display());
    Ok(())
}

/// snake_case keys written by the desktop app → camelCase keys used here.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("ai_provider", "aiProvider"),
    ("api_keys", "apiKeys"),
    ("ollama_url", "ollamaUrl"),
    ("ollama_model", "ollamaModel"),
    ("selected_locale", "selectedLocale"),
];

/// Rename legacy snake_case keys. An existing camelCase key wins.
fn migrate_settings(raw: &mut serde_json::Value) {
    let Some(obj) = raw.as_object_mut() else {
        return;
    };

    for (legacy, current) in LEGACY_KEYS {
        if let Some(value) = obj.remove(*legacy) {
            if obj.contains_key(*current) {
                continue;
            }
            obj.insert((*current).to_string(), value);
            debug!("Migrated settings key {} → {}", legacy, current);
        }
    }
}

/// Apply environment variable overrides on top of loaded settings.
///
/// Supported overrides:
/// - `MARCIA_AI_PROVIDER` → `ai_provider`
/// - `MARCIA_API_KEYS__<NAME>` → `api_keys.<name>` (for every provider id)
/// - `MARCIA_OLLAMA_URL` → `ollama_url`
/// - `MARCIA_OLLAMA_MODEL` → `ollama_model`
/// - `MARCIA_SELECTED_LOCALE` → `selected_locale`
/// - `MARCIA_PROXY_URL` → `proxy_url`
/// - `MARCIA_REQUEST_TIMEOUT_SECS` → `request_timeout_secs`
fn apply_env_overrides<F>(mut settings: Settings, var: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var("MARCIA_AI_PROVIDER") {
        settings.ai_provider = val;
    }

    for id in crate::types::ProviderId::ALL {
        let key = format!("MARCIA_API_KEYS__{}", id.as_str().to_uppercase());
        if let Some(val) = var(&key) {
            settings.set_api_key(id, val);
        }
    }

    if let Some(val) = var("MARCIA_OLLAMA_URL") {
        settings.ollama_url = val;
    }
    if let Some(val) = var("MARCIA_OLLAMA_MODEL") {
        settings.ollama_model = val;
    }
    if let Some(val) = var("MARCIA_SELECTED_LOCALE") {
        settings.selected_locale = val;
    }
    if let Some(val) = var("MARCIA_PROXY_URL") {
        settings.proxy_url = Some(val);
    }
    if let Some(val) = var("MARCIA_REQUEST_TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(secs) if secs > 0 => settings.request_timeout_secs = secs,
            _ => warn!("Ignoring invalid MARCIA_REQUEST_TIMEOUT_SECS: {}", val),
        }
    }

    settings
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let settings = load_settings_from_path(Path::new("/nonexistent/path/settings.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(r#"{
            "aiProvider": "gemini",
            "apiKeys": { "gemini": "g-123" },
            "ollamaModel": "gemma3:1b"
        }"#);

        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.provider().unwrap(), ProviderId::Gemini);
        assert_eq!(settings.api_key(ProviderId::Gemini), Some("g-123"));
        assert_eq!(settings.ollama_model, "gemma3:1b");
        // Default preserved
        assert_eq!(settings.selected_locale, "pt-BR");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let file = write_temp_json(r#"{ "requestTimeoutSecs": "soon" }"#);
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.request_timeout_secs, 120);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.ai_provider, "claude");
    }

    #[test]
    fn test_migrate_desktop_app_file() {
        let file = write_temp_json(r#"{
            "ai_provider": "maritaca",
            "api_keys": { "maritaca": "mk-1", "openai": "" },
            "ollama_url": "http://192.168.0.10:11434",
            "ollama_model": "llama3",
            "selected_locale": "en-US"
        }"#);

        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.provider().unwrap(), ProviderId::Maritaca);
        assert_eq!(settings.api_key(ProviderId::Maritaca), Some("mk-1"));
        assert_eq!(settings.ollama_url, "http://192.168.0.10:11434");
        assert_eq!(settings.ollama_model, "llama3");
        assert_eq!(settings.selected_locale, "en-US");
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let file = write_temp_json(r#"{
            "aiProvider": "openai",
            "ai_provider": "gemini"
        }"#);

        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.ai_provider, "openai");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.ai_provider = "openai".to_string();
        settings.set_api_key(ProviderId::OpenAi, "sk-test");
        settings.proxy_url = Some("http://proxy.local:3128".to_string());

        save_settings(&settings, Some(&path)).unwrap();

        let reloaded = load_settings_from_path(&path);
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        save_settings(&Settings::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw.get("ollamaUrl").is_some());
        assert!(raw.get("ollama_url").is_none());
    }

    #[test]
    fn test_env_override_provider_and_keys() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[
                ("MARCIA_AI_PROVIDER", "ollama"),
                ("MARCIA_API_KEYS__CLAUDE", "sk-ant-env"),
                ("MARCIA_OLLAMA_URL", "http://gpu-box:11434/"),
            ]),
        );
        assert_eq!(settings.provider().unwrap(), ProviderId::Ollama);
        assert_eq!(settings.api_key(ProviderId::Claude), Some("sk-ant-env"));
        assert_eq!(settings.ollama_url, "http://gpu-box:11434/");
    }

    #[test]
    fn test_env_override_proxy_and_timeout() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[
                ("MARCIA_PROXY_URL", "http://127.0.0.1:8888"),
                ("MARCIA_REQUEST_TIMEOUT_SECS", "15"),
            ]),
        );
        assert_eq!(settings.proxy_url(), Some("http://127.0.0.1:8888"));
        assert_eq!(settings.request_timeout_secs, 15);
    }

    #[test]
    fn test_env_override_invalid_timeout_ignored() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[("MARCIA_REQUEST_TIMEOUT_SECS", "forever")]),
        );
        assert_eq!(settings.request_timeout_secs, 120);
    }

    #[test]
    fn test_env_override_zero_timeout_ignored() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[("MARCIA_REQUEST_TIMEOUT_SECS", "0")]),
        );
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_zero_timeout_uses_default() {
        let file = write_temp_json(r#"{ "aiProvider": "openai", "requestTimeoutSecs": 0 }"#);
        let settings = load_settings_from_path(file.path());
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(settings.ai_provider, "openai");
    }

    #[test]
    fn test_no_env_leaves_settings_untouched() {
        let settings = apply_env_overrides(Settings::default(), env(&[]));
        assert_eq!(settings, Settings::default());
    }
}
