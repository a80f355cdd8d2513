//! Provider gateway for M.A.R.C.I.A.
//!
//! Turns a grievance into a pettiness verdict by talking to one of several
//! LLM providers over their native wire protocol.
//!
//! # Architecture
//!
//! - [`registry`]: static descriptors for the five supported providers
//! - [`transport::HttpTransport`]: injected HTTP seam (direct or proxied)
//! - [`dispatcher`]: builds the protocol-specific request and sends it
//! - [`normalizer`]: pulls the answer text out and validates the verdict
//! - [`discovery`]: lists the models a self-hosted endpoint offers
//! - [`gateway::Gateway`]: validate, dispatch, normalize

pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod normalizer;
pub mod prompt;
pub mod registry;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use discovery::ModelDiscovery;
pub use dispatcher::{Dispatcher, RawProviderResponse};
pub use error::{GatewayError, TransportError, ValidationError};
pub use gateway::Gateway;
pub use registry::{ProviderDescriptor, ProviderRegistry, PROVIDERS};
pub use transport::{build_transport, DirectTransport, HttpTransport, ProxiedTransport};
