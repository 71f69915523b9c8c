//! Remote JSON retrieval.
//!
//! Every network read in the pipeline goes through [`JsonFetcher`]: one
//! GET, whole body read, parsed as JSON. There is no retry, no caching, and
//! no timeout beyond the transport defaults. A hung request blocks the run.
//!
//! HTTP status is deliberately not checked. The exports are static files,
//! so a missing resource shows up as an HTML error page that fails to parse,
//! and a JSON error body parses like any other document. Callers decide what
//! an unusable document means.
//!
//! The trait exists so the catalog and orchestrator can be driven by canned
//! responses in tests; [`HttpFetcher`] is the only production implementation.

use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("response from {url} is not valid JSON: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// The URL the failed call was made for, when there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Parse { url, .. } => Some(url),
            FetchError::Client(_) => None,
        }
    }
}

/// Source of JSON documents addressed by URL.
pub trait JsonFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Blocking HTTPS fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("participa-site/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl JsonFetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let parsed = require_https(url)?;
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(source),
        };

        let response = self.client.get(parsed).send().map_err(transport)?;
        debug!(url, status = response.status().as_u16(), "fetched");
        let body = response.text().map_err(transport)?;
        parse_body(url, &body)
    }
}

/// Reject anything that is not an absolute `https://` URL with a host.
pub fn require_https(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(invalid(format!("scheme '{}' is not https", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(parsed)
}

/// Parse a response body, attributing failures to `url`.
pub fn parse_body(url: &str, body: &str) -> Result<Value, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Parse {
        url: url.to_string(),
        source,
    })
}
