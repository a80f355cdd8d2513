//! Settings: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use marcia_core::config;
//!
//! let settings = config::load_settings(None);
//! println!("Provider: {}", settings.ai_provider);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_settings_path, load_settings, save_settings};
pub use schema::{Settings, DEFAULT_OLLAMA_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
