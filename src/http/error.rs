use std::time::Duration;

use thiserror::Error;

/// The request never produced a response. Distinct from assertion failures:
/// a 404 or 500 is a normal snapshot, not a `TransportError`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid request URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid request header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("Could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    pub(crate) fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout { url, timeout }
        } else if err.is_connect() {
            TransportError::Connect { url, source: err }
        } else {
            TransportError::Request { url, source: err }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}
