//! Error taxonomy for the provider gateway.
//!
//! Every error produced while dispatching a request or normalizing its
//! response reaches the caller unchanged. Nothing here is retried.

use marcia_core::{ProviderId, UnknownProviderId};
use thiserror::Error;

/// Network-level failure: the request never produced an HTTP status.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured proxy URL was rejected.
    #[error("invalid proxy URL '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// DNS, connection refused, TLS, reset, … while sending or reading.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Request URL with its query string removed.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failure reported by a transport that is not backed by reqwest.
    #[error("{0}")]
    Other(String),
}

/// Why a request was rejected before anything was sent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("grievance text is empty")]
    EmptyText,

    #[error("no API key configured for {0}")]
    MissingCredential(ProviderId),

    #[error("API key for {0} contains characters that cannot be sent")]
    InvalidCredential(ProviderId),

    #[error("endpoint '{0}' is not a valid URL")]
    InvalidEndpoint(String),
}

/// Everything that can go wrong in [`crate::Gateway::analyze`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderId),

    /// A registry was built with the same provider id twice.
    #[error("provider '{0}' is registered more than once")]
    DuplicateProvider(ProviderId),

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The provider answered with a non-2xx status.
    #[error("{provider} API error: {status} - {status_text}")]
    ProviderHttp {
        provider: ProviderId,
        status: u16,
        status_text: String,
    },

    /// The response envelope held no text where the answer should be.
    #[error("no response from {provider}")]
    EmptyResponse { provider: ProviderId },

    /// The answer was not JSON, even after stripping code fences.
    #[error("model answer is not valid JSON: {source}")]
    MalformedResponse {
        raw_text: String,
        #[source]
        source: serde_json::Error,
    },

    /// The answer parsed, but fields are missing, mistyped, or out of range.
    #[error("model answer does not match the expected schema: {0}")]
    SchemaViolation(String),
}

impl GatewayError {
    /// Whether the failure points at a missing or rejected API key.
    ///
    /// Front ends use this to suggest opening the settings.
    pub fn is_credential_problem(&self) -> bool {
        match self {
            GatewayError::Validation(
                ValidationError::MissingCredential(_) | ValidationError::InvalidCredential(_),
            ) => true,
            GatewayError::ProviderHttp { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}
