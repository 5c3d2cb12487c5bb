//! HTTP command transport over reqwest.

use crate::domain::{ConnectorConfig, ConnectorError, TransportError};
use crate::ports::{CommandTransport, HttpResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use tracing::trace;

/// Posts command bodies to the connector's REST API.
pub struct HttpCommandTransport {
    client: reqwest::Client,
    base_url: Url,
    auth: Option<(String, Option<String>)>,
}

impl HttpCommandTransport {
    /// Build a client from validated connector configuration.
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let base_url = config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConnectorError::InvalidConfig {
                    key: "headers",
                    reason: format!("'{}': {}", name, e),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| ConnectorError::InvalidConfig {
                key: "headers",
                reason: format!("'{}': {}", name, e),
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::InvalidConfig {
                key: "url",
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        let auth = config
            .auth_username
            .clone()
            .filter(|u| !u.is_empty())
            .map(|user| (user, config.auth_password.clone()));

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }
}

#[async_trait]
impl CommandTransport for HttpCommandTransport {
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let url = ConnectorConfig::command_url(&self.base_url, path);
        trace!(url = %url, "POST");

        let mut request = self.client.post(&url).json(&body);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
