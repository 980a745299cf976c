//! Probe transport: the pluggable capability that actually talks to a
//! connection's endpoint.
//!
//! [`HttpTransport`] covers `http` and `https` targets. Other protocols are
//! supplied by implementing [`ProbeTransport`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::HttpMethod;

/// Failure of a single probe attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The attempt did not finish within its timeout
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// The remote host refused the connection
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The host could not be resolved
    #[error("DNS resolution failed: {0}")]
    DnsResolutionFailed(String),

    /// Any other network-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The target uses a scheme this transport cannot probe
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a 5xx status
    #[error("Server error: HTTP {0}")]
    ServerError(u16),

    /// The server rejected the credentials (401/403)
    #[error("Authentication rejected: HTTP {0}")]
    AuthRejected(u16),

    /// The server answered with a 4xx status
    #[error("Client error: HTTP {0}")]
    ClientError(u16),

    /// The status did not match the expected one
    #[error("Unexpected status: expected {expected}, got {actual}")]
    UnexpectedStatus {
        /// Expected status, or `2xx` when unset
        expected: String,
        /// Observed status
        actual: u16,
    },
}

impl ProbeError {
    /// Returns true for failures that may succeed on retry
    ///
    /// Timeouts, connect-level errors and 5xx responses are transient.
    /// Client errors, rejected credentials and status mismatches are
    /// definitive.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::ConnectionRefused(_)
                | Self::DnsResolutionFailed(_)
                | Self::Network(_)
                | Self::ServerError(_)
        )
    }

    /// HTTP status carried by the error, if a response was received
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError(s) | Self::AuthRejected(s) | Self::ClientError(s) => Some(*s),
            Self::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

/// A provider-agnostic test request
#[derive(Clone)]
pub struct ProbeRequest {
    /// Absolute target URL
    pub url: String,
    /// Request method
    pub method: HttpMethod,
    /// Headers derived from credentials
    pub headers: BTreeMap<String, SecretString>,
    /// Query parameters derived from credentials
    pub query: Vec<(String, SecretString)>,
    /// HTTP Basic credentials
    pub basic_auth: Option<(String, SecretString)>,
}

impl ProbeRequest {
    /// Creates a request with no authentication
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            query: Vec::new(),
            basic_auth: None,
        }
    }

    /// Returns true if a header with this name (case-insensitive) is set
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Returns the exposed value of a header, for tests and transports
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.expose_secret())
    }
}

impl std::fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRequest")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field(
                "query",
                &self.query.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("basic_auth", &self.basic_auth.as_ref().map(|(u, _)| u))
            .finish()
    }
}

/// What came back from a probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
}

/// Sends one probe attempt
///
/// Implementations report connect-level failures as [`ProbeError`] and
/// return any received status as a [`ProbeResponse`]; status classification
/// happens in the tester.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Sends `request`, giving up after `timeout`
    async fn send(
        &self,
        request: &ProbeRequest,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError>;
}

/// `reqwest`-backed transport for `http` and `https` targets
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given user agent
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::InvalidRequest` if the HTTP client cannot be
    /// initialised.
    pub fn new(user_agent: &str) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProbeError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn send(
        &self,
        request: &ProbeRequest,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        let url = Url::parse(&request.url)
            .map_err(|e| ProbeError::InvalidRequest(format!("{}: {e}", request.url)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ProbeError::UnsupportedScheme(other.to_string())),
        }

        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| ProbeError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, url).timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.expose_secret());
        }
        if !request.query.is_empty() {
            let query: Vec<(&str, &str)> = request
                .query
                .iter()
                .map(|(k, v)| (k.as_str(), v.expose_secret()))
                .collect();
            builder = builder.query(&query);
        }
        if let Some((ref user, ref password)) = request.basic_auth {
            builder = builder.basic_auth(user, Some(password.expose_secret()));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;
        Ok(ProbeResponse {
            status: response.status().as_u16(),
        })
    }
}

fn classify_reqwest_error(error: &reqwest::Error, timeout: Duration) -> ProbeError {
    if error.is_timeout() {
        return ProbeError::Timeout(timeout.as_secs());
    }
    if error.is_builder() {
        return ProbeError::InvalidRequest(error.to_string());
    }

    let chain = error_chain(error).to_lowercase();
    if error.is_connect() {
        if chain.contains("refused") {
            return ProbeError::ConnectionRefused(error.to_string());
        }
        if chain.contains("dns")
            || chain.contains("resolve")
            || chain.contains("name or service not known")
            || chain.contains("no such host")
        {
            return ProbeError::DnsResolutionFailed(error.to_string());
        }
    }
    ProbeError::Network(error.to_string())
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
