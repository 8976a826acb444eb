//! reqwest-backed transport.
//!
//! One `reqwest::Client` is built per provider and shared by every
//! transport it hands out, so connection pooling spans all pipes.

use crate::error::{HttpError, HttpResult};
use crate::transport::{HeaderAndBody, HttpMethod, Transport, TransportProvider};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the shared HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP connect timeout (ms).
    pub connect_timeout_ms: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            user_agent: format!("restpipe/{}", env!("CARGO_PKG_VERSION")),
            default_headers: BTreeMap::new(),
        }
    }
}

/// Hands out [`HttpTransport`]s sharing one client and one header set.
#[derive(Debug, Clone)]
pub struct HttpTransportProvider {
    client: Client,
    headers: Arc<RwLock<HeaderMap>>,
}

impl HttpTransportProvider {
    /// Creates a provider with the default configuration.
    pub fn new() -> HttpResult<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a provider from a configuration.
    pub fn with_config(config: &HttpConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        let provider = Self {
            client,
            headers: Arc::new(RwLock::new(HeaderMap::new())),
        };
        for (name, value) in &config.default_headers {
            provider.set_default_header(name, value)?;
        }
        Ok(provider)
    }

    /// Sets a header sent by every transport from this provider, including
    /// transports already handed out.
    pub fn set_default_header(&self, name: &str, value: &str) -> HttpResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
        Ok(())
    }

    /// Removes a default header.
    pub fn remove_default_header(&self, name: &str) {
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl TransportProvider for HttpTransportProvider {
    fn get(&self, url: Url, timeout: Duration) -> HttpResult<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport {
            client: self.client.clone(),
            headers: Arc::clone(&self.headers),
            url,
            timeout,
        }))
    }
}

/// A transport bound to one URL, issuing JSON requests through reqwest.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    headers: Arc<RwLock<HeaderMap>>,
    url: Url,
    timeout: Duration,
}

impl HttpTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        body: Option<Vec<u8>>,
    ) -> HttpResult<HeaderAndBody> {
        let verb = match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };
        let defaults = self
            .headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut request = self
            .client
            .request(verb, self.url.clone())
            .timeout(self.timeout)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .headers(defaults);
        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(%method, url = %self.url, "sending request");
        let response = request.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        debug!(%method, url = %self.url, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(HeaderAndBody {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn url(&self) -> &Url {
        &self.url
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self) -> HttpResult<HeaderAndBody> {
        self.execute(HttpMethod::Get, None).await
    }

    async fn post(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody> {
        self.execute(HttpMethod::Post, Some(body)).await
    }

    async fn put(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody> {
        self.execute(HttpMethod::Put, Some(body)).await
    }

    async fn delete(&self) -> HttpResult<HeaderAndBody> {
        self.execute(HttpMethod::Delete, None).await
    }
}
