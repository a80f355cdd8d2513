//! The single entry point front ends talk to.
//!
//! ```no_run
//! use std::sync::Arc;
//! use marcia_core::{AnalysisRequest, ProviderId};
//! use marcia_providers::{DirectTransport, Gateway, ProviderRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::new(
//!     Arc::new(ProviderRegistry::builtin()),
//!     Arc::new(DirectTransport::new()?),
//! );
//! let request = AnalysisRequest::new("Pegaram minha vaga de novo", ProviderId::Claude)
//!     .with_credential("sk-ant-…");
//! let verdict = gateway.analyze(&request).await?;
//! println!("{}: {}", verdict.score, verdict.judgment);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use marcia_core::{AnalysisRequest, AnalysisResult};

use crate::discovery::ModelDiscovery;
use crate::dispatcher::Dispatcher;
use crate::error::{GatewayError, ValidationError};
use crate::normalizer::{extract_text, parse_structured};
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::transport::HttpTransport;

/// Validate → dispatch → normalize, over an injected registry and transport.
pub struct Gateway {
    registry: Arc<ProviderRegistry>,
    dispatcher: Dispatcher,
    discovery: ModelDiscovery,
}

impl Gateway {
    pub fn new(registry: Arc<ProviderRegistry>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry.clone(), transport.clone()),
            discovery: ModelDiscovery::new(transport),
            registry,
        }
    }

    /// Score one grievance.
    ///
    /// Rejects blank text and missing credentials before touching the
    /// network. Every other failure comes back exactly as it happened.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError> {
        let spec = self.registry.describe(request.provider)?;
        validate(spec, request)?;

        let raw = self.dispatcher.dispatch(request).await?;

        let text = extract_text(raw.protocol, raw.body)
            .ok_or(GatewayError::EmptyResponse { provider: raw.provider })?;
        let result = parse_structured(&text)?;

        info!(
            provider = %raw.provider,
            score = result.score,
            category = %result.category,
            "Grievance analyzed"
        );
        Ok(result)
    }

    /// Models offered by a self-hosted endpoint; empty if it cannot be listed.
    pub async fn list_discovered_models(&self, endpoint: &str) -> Vec<String> {
        self.discovery.discover(endpoint).await
    }

    /// Every configured provider, for a selection control.
    pub fn list_providers(&self) -> &[ProviderDescriptor] {
        self.registry.list()
    }
}

/// Check a request against its provider before anything is sent.
pub fn validate(spec: &ProviderDescriptor, request: &AnalysisRequest) -> Result<(), ValidationError> {
    if request.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if spec.id.requires_credential() && request.credential().is_none() {
        debug!(provider = %spec.id, "rejecting request without credential");
        return Err(ValidationError::MissingCredential(spec.id));
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
