//! # Endpoint Configuration
//!
//! The base endpoint every request of a run is issued against. A config is
//! built once, then only read: verifiers borrow it, they never change it.
//!
//! Values come from explicit builder calls or from the environment:
//! - `HTTPCONTRACT_BASE_URL` (required for [`EndpointConfig::from_env`])
//! - `HTTPCONTRACT_TIMEOUT_MS` (optional, positive integer)

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("httpcontract/", env!("CARGO_PKG_VERSION"));

/// Environment keys read by [`EndpointConfig::from_env`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEnv {
    BaseUrl,
    TimeoutMs,
}

impl ConfigEnv {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigEnv::BaseUrl => "HTTPCONTRACT_BASE_URL",
            ConfigEnv::TimeoutMs => "HTTPCONTRACT_TIMEOUT_MS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error("{0} must be valid UTF-8")]
    NonUtf8Env(&'static str),
    #[error("{0} must not be empty")]
    EmptyEnv(&'static str),
    #[error("timeout must be a positive number of milliseconds, got `{0}`")]
    InvalidTimeout(String),
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Immutable description of the service under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_url: Url,
    timeout: Duration,
    user_agent: String,
    headers: BTreeMap<String, String>,
}

impl EndpointConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: &str) -> EndpointConfigBuilder {
        EndpointConfigBuilder {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var_os(name))
    }

    /// Same as [`EndpointConfig::from_env`], reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let base_url = read_var_nonempty(&lookup, ConfigEnv::BaseUrl)?
            .ok_or(ConfigError::MissingEnv(ConfigEnv::BaseUrl.as_str()))?;
        let mut builder = Self::builder(&base_url);
        if let Some(raw) = read_var_nonempty(&lookup, ConfigEnv::TimeoutMs)? {
            builder = builder.timeout(parse_timeout_ms(&raw)?);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Headers attached to every request, keyed by lowercase name.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Join `path` onto the base URL. The base path is kept, so a base of
    /// `https://host/api` and a path of `/posts/1` give `https://host/api/posts/1`.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfigBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    headers: BTreeMap<String, String>,
}

impl EndpointConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().trim().to_ascii_lowercase(), value.into());
        self
    }

    pub fn build(self) -> Result<EndpointConfig, ConfigError> {
        let raw = self.base_url.trim();
        let base_url = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme `{}`", base_url.scheme()),
            });
        }
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(ConfigError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "base URL must not carry a query or fragment".to_string(),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }

        for (name, value) in &self.headers {
            if name.is_empty() {
                return Err(ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: "header name is empty".to_string(),
                });
            }
            reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                }
            })?;
            reqwest::header::HeaderValue::from_str(value).map_err(|err| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        }

        Ok(EndpointConfig {
            base_url,
            timeout: self.timeout,
            user_agent: self.user_agent,
            headers: self.headers,
        })
    }
}

/// Parse a positive millisecond count.
pub fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout(trimmed.to_string())),
    }
}

fn read_var_nonempty(
    lookup: &impl Fn(&str) -> Option<OsString>,
    key: ConfigEnv,
) -> Result<Option<String>, ConfigError> {
    let name = key.as_str();
    match lookup(name) {
        None => Ok(None),
        Some(raw) => {
            let value = raw.into_string().map_err(|_| ConfigError::NonUtf8Env(name))?;
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyEnv(name));
            }
            Ok(Some(value))
        }
    }
}
