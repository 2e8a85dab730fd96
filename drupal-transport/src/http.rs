//! `reqwest`-based implementation of the transport contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::traits::Transport;
use crate::types::{CallConfig, Method, TransportResponse};

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Backend base URL, e.g. `https://cms.example.com`.
    pub base_url: String,
    /// Optional bearer token sent on every request.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// # Example
///
/// ```rust,no_run
/// use drupal_transport::{HttpConfig, HttpTransport};
///
/// let transport = HttpTransport::new(HttpConfig {
///     base_url: "https://cms.example.com".into(),
///     ..Default::default()
/// });
/// ```
pub struct HttpTransport {
    config: HttpConfig,
    client: Client,
}

impl HttpTransport {
    /// Create a new transport.
    pub fn new(config: HttpConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.api+json, application/json"),
        );
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .expect("Invalid API key"),
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        config: CallConfig,
    ) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url(), path);
        debug!(%method, %url, params = config.params.len(), "transport call");

        let mut request = self
            .client
            .request(Self::reqwest_method(method), &url)
            .query(&config.params);

        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(data) = &config.data {
            request = request
                .header(header::CONTENT_TYPE, "application/vnd.api+json")
                .json(data);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            data,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let transport = HttpTransport::new(HttpConfig {
            base_url: "http://cms.test/".into(),
            ..Default::default()
        });
        assert_eq!(transport.base_url(), "http://cms.test");
    }
}
