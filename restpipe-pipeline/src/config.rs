//! Pipe configuration.

use crate::error::PipeResult;
use restpipe_http::{Url, append_to_base_url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default per-request timeout for pipes (ms).
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// The kind of pipe backing a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipeType {
    #[default]
    Rest,
}

impl fmt::Display for PipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeType::Rest => f.write_str("REST"),
        }
    }
}

/// Resource-level pipe configuration.
///
/// `name` and `endpoint` start out equal but are independent afterwards;
/// callers may point a pipe named `widgets` at `v2/widgets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeConfig {
    /// Base URL the endpoint is resolved against.
    pub base_url: Url,
    /// Logical name of the pipe.
    pub name: String,
    /// Endpoint path relative to `base_url`.
    pub endpoint: String,
    /// Pipe type tag.
    #[serde(default, rename = "type")]
    pub pipe_type: PipeType,
    /// Per-request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl PipeConfig {
    /// Creates a config whose endpoint defaults to `name`.
    pub fn new(base_url: Url, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            base_url,
            endpoint: name.clone(),
            name,
            pipe_type: PipeType::Rest,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Creates a config named after the lowercase simple name of `T`.
    ///
    /// ```
    /// use restpipe_pipeline::PipeConfig;
    /// use restpipe_http::Url;
    ///
    /// struct Widget;
    /// let config = PipeConfig::for_type::<Widget>(Url::parse("http://example.org/").unwrap());
    /// assert_eq!(config.name, "widget");
    /// assert_eq!(config.endpoint, "widget");
    /// ```
    pub fn for_type<T: ?Sized>(base_url: Url) -> Self {
        Self::new(base_url, simple_type_name::<T>())
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The absolute URL of the resource collection.
    pub fn resource_url(&self) -> PipeResult<Url> {
        Ok(append_to_base_url(&self.base_url, &self.endpoint)?)
    }
}

/// Lowercase simple name of a type: module path and generic arguments
/// stripped, so `app::model::Widget<u8>` becomes `widget`.
pub fn simple_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}
