//! HTTP transport: the seam between the gateway and the network.
//!
//! The dispatcher and model discovery only ever see [`HttpTransport`]. Which
//! implementation sits behind it is decided once at startup:
//!
//! - [`DirectTransport`]: a plain `reqwest` client
//! - [`ProxiedTransport`]: a `reqwest` client that routes every request
//!   through a configured proxy (for sandboxed execution contexts)
//!
//! Neither transport sets a request timeout; callers impose their own deadline.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::TransportError;

// ─────────────────────────────────────────────
// Request / response
// ─────────────────────────────────────────────

/// A fully built HTTP request: method, URL, headers and optional JSON body.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// A `GET` with no headers and no body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// A `POST` carrying `body` as JSON.
    pub fn post_json(url: impl Into<String>, headers: HeaderMap, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }

    /// The URL without its query string, safe to log.
    pub fn redacted_url(&self) -> &str {
        redact_url(&self.url)
    }
}

/// Status line and body of a completed HTTP exchange.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Strip the query string (which may carry an API key) from a URL.
pub fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Sends one request and returns whatever status the server answered with.
///
/// Non-2xx statuses are *not* errors at this level; only failures that
/// prevent a status from being read are.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Name for logging.
    fn name(&self) -> &str;
}

// ─────────────────────────────────────────────
// reqwest-backed transports
// ─────────────────────────────────────────────

/// Talks to providers directly.
#[derive(Clone, Debug)]
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for DirectTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        execute(&self.client, request).await
    }

    fn name(&self) -> &str {
        "direct"
    }
}

/// Routes every request (HTTP and HTTPS) through one proxy.
#[derive(Clone, Debug)]
pub struct ProxiedTransport {
    client: reqwest::Client,
    proxy_url: String,
}

impl ProxiedTransport {
    pub fn new(proxy_url: &str) -> Result<Self, TransportError> {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|source| {
            TransportError::InvalidProxy {
                url: proxy_url.to_string(),
                source,
            }
        })?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            proxy_url: proxy_url.to_string(),
        })
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }
}

#[async_trait]
impl HttpTransport for ProxiedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        execute(&self.client, request).await
    }

    fn name(&self) -> &str {
        "proxied"
    }
}

/// Pick the transport for this process: proxied when a proxy URL is given.
pub fn build_transport(proxy_url: Option<&str>) -> Result<Arc<dyn HttpTransport>, TransportError> {
    match proxy_url {
        Some(url) => {
            debug!(proxy = url, "using proxied HTTP transport");
            Ok(Arc::new(ProxiedTransport::new(url)?))
        }
        None => Ok(Arc::new(DirectTransport::new()?)),
    }
}

async fn execute(
    client: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let url = redact_url(&request.url).to_string();
    let request_error = |e: reqwest::Error| TransportError::Request {
        url: url.clone(),
        source: e.without_url(),
    };

    let mut builder = client
        .request(request.method, &request.url)
        .headers(request.headers);
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await.map_err(|e| {
        let err = request_error(e);
        warn!(error = %err, "HTTP request failed");
        err
    })?;

    let status = response.status();
    let body = response.bytes().await.map_err(request_error)?;

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body: body.to_vec(),
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
