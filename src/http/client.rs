use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::config::EndpointConfig;

use super::error::TransportError;
use super::request::RequestDescription;
use super::response::ResponseSnapshot;

/// Issues described requests against one endpoint and captures snapshots.
///
/// Holds no state between calls beyond the connection pool of its client,
/// so one verifier serves a whole serial run. Concurrent runs should give
/// each worker its own verifier.
#[derive(Debug, Clone)]
pub struct Verifier<'a> {
    config: &'a EndpointConfig,
    client: Client,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a EndpointConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EndpointConfig {
        self.config
    }

    /// Send one request and capture its response. Fails only when no
    /// response arrived; non-2xx statuses are returned as snapshots.
    pub fn send(&self, request: &RequestDescription) -> Result<ResponseSnapshot, TransportError> {
        let mut url = self
            .config
            .url_for(&request.path)
            .map_err(|err| TransportError::InvalidUrl {
                url: request.path.clone(),
                reason: err.to_string(),
            })?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        let url_text = url.to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let (ua_name, ua_value) = parse_header(USER_AGENT.as_str(), self.config.user_agent())?;
        headers.insert(ua_name, ua_value);
        // Per-request headers override the endpoint defaults.
        for (name, value) in self.config.headers().iter().chain(request.headers.iter().map(|(n, v)| (n, v))) {
            let (header_name, header_value) = parse_header(name, value)?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = self.client.request(request.method.into(), url).headers(headers);
        if let Some(body) = request.effective_body() {
            req_builder = req_builder.json(body);
        }

        debug!(method = %request.method, url = %url_text, "sending request");
        let started = Instant::now();
        let response = req_builder.send().map_err(|err| {
            let err = TransportError::classify(&url_text, self.config.timeout(), err);
            warn!(method = %request.method, url = %url_text, error = %err, "transport failure");
            err
        })?;
        let elapsed = started.elapsed();

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response.bytes().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout {
                    url: url_text.clone(),
                    timeout: self.config.timeout(),
                }
            } else {
                TransportError::Body {
                    url: url_text.clone(),
                    source: err,
                }
            }
        })?;

        debug!(
            method = %request.method,
            url = %url_text,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            size_bytes = bytes.len(),
            "captured response"
        );

        Ok(ResponseSnapshot::new(status, headers, bytes.to_vec(), elapsed))
    }
}

/// One-shot form of [`Verifier::send`] for callers without a verifier.
pub fn send(config: &EndpointConfig, request: &RequestDescription) -> Result<ResponseSnapshot, TransportError> {
    Verifier::new(config)?.send(request)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| TransportError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value.trim()).map_err(|e| TransportError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}
