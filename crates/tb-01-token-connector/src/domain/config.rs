//! # Connector Configuration

use super::errors::ConnectorError;
use super::value_objects::DEFAULT_WS_PATH;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration section name used in error messages.
const CONFIG_SECTION: &str = "tokens.fftokens";

/// Configuration for one token connector instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Base HTTP(S) URL of the connector. Mandatory.
    pub url: String,
    /// Path of the event WebSocket, relative to the connector host.
    pub ws_path: Option<String>,
    /// Timeout for each command request.
    pub request_timeout_ms: u64,
    /// Timeout for opening HTTP and WebSocket connections.
    pub connect_timeout_ms: u64,
    /// Extra headers sent with every command request.
    pub headers: HashMap<String, String>,
    /// Basic auth user name.
    pub auth_username: Option<String>,
    /// Basic auth password.
    pub auth_password: Option<String>,
    /// Inbound frames buffered between the socket reader and the event loop.
    pub event_buffer_size: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            ws_path: None,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            headers: HashMap::new(),
            auth_username: None,
            auth_password: None,
            event_buffer_size: 256,
        }
    }
}

impl ConnectorConfig {
    /// Config pointing at `url` with defaults for everything else.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Validate and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, ConnectorError> {
        if self.url.trim().is_empty() {
            return Err(ConnectorError::MissingConfig {
                key: "url",
                section: CONFIG_SECTION,
            });
        }
        let url = Url::parse(self.url.trim()).map_err(|e| ConnectorError::InvalidConfig {
            key: "url",
            reason: format!("'{}': {}", self.url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConnectorError::InvalidConfig {
                key: "url",
                reason: format!("unsupported scheme '{}', expected http or https", url.scheme()),
            });
        }
        if self.event_buffer_size == 0 {
            return Err(ConnectorError::InvalidConfig {
                key: "event_buffer_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(url)
    }

    /// Event channel URL: same host, `ws`/`wss` scheme, configured or default path.
    pub fn ws_url(&self) -> Result<Url, ConnectorError> {
        let mut url = self.validate()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ConnectorError::InvalidConfig {
                key: "url",
                reason: format!("cannot derive {} URL from '{}'", scheme, self.url),
            })?;
        let path = self
            .ws_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_WS_PATH);
        url.set_path(path);
        url.set_query(None);
        Ok(url)
    }

    /// Full URL of a command endpoint.
    ///
    /// The path is appended to the base URL, so a base with a path prefix
    /// keeps it.
    pub fn command_url(base: &Url, path: &str) -> String {
        format!("{}{}", base.as_str().trim_end_matches('/'), path)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Connection establishment timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
