//! Transport layer abstraction.
//!
//! Defines the narrow contract the pipeline and authentication crates use
//! to reach the network, so that any HTTP stack can sit behind them.

use crate::error::HttpResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Status, headers and raw body of a completed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAndBody {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HeaderAndBody {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header (name is lowercased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// The HTTP verbs a transport supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        })
    }
}

/// A transport bound to one URL and timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The URL every request is sent to.
    fn url(&self) -> &Url;

    /// The per-request timeout.
    fn timeout(&self) -> Duration;

    /// Issues a GET.
    async fn get(&self) -> HttpResult<HeaderAndBody>;

    /// Issues a POST with the given body.
    async fn post(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody>;

    /// Issues a PUT with the given body.
    async fn put(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody>;

    /// Issues a DELETE.
    async fn delete(&self) -> HttpResult<HeaderAndBody>;
}

/// Produces configured transports on demand.
pub trait TransportProvider: Send + Sync {
    /// Returns a transport bound to `url` with the given timeout.
    fn get(&self, url: Url, timeout: Duration) -> HttpResult<Arc<dyn Transport>>;
}

/// A recording transport provider for testing.
pub mod mock {
    use super::*;
    use crate::error::HttpError;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
        shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A request captured by [`MockTransportProvider`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub method: HttpMethod,
        pub url: Url,
        pub timeout: Duration,
        pub body: Vec<u8>,
    }

    impl RecordedRequest {
        /// The body deserialized as JSON.
        pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
            serde_json::from_slice(&self.body)
        }
    }

    #[derive(Debug, Default)]
    struct Shared {
        requests: Vec<RecordedRequest>,
        queued: VecDeque<HeaderAndBody>,
        fallback: Option<HeaderAndBody>,
        provided: usize,
    }

    /// Records every request and answers from a queue of canned responses.
    ///
    /// Responses with a non-2xx status are returned as
    /// [`HttpError::Status`], matching the reqwest transport. When the queue
    /// is empty the fallback response is used (`200` with an empty body
    /// unless overridden).
    #[derive(Debug, Clone, Default)]
    pub struct MockTransportProvider {
        shared: Arc<Mutex<Shared>>,
    }

    impl MockTransportProvider {
        /// Creates a provider answering `200` with an empty body.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a response for the next request.
        pub fn push_response(&self, response: HeaderAndBody) {
            lock(&self.shared).queued.push_back(response);
        }

        /// Sets the response used when the queue is empty.
        pub fn set_fallback(&self, response: HeaderAndBody) {
            lock(&self.shared).fallback = Some(response);
        }

        /// All requests issued so far, in order.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            lock(&self.shared).requests.clone()
        }

        /// The most recent request.
        pub fn last_request(&self) -> Option<RecordedRequest> {
            lock(&self.shared).requests.last().cloned()
        }

        /// How many transports have been handed out.
        pub fn provided(&self) -> usize {
            lock(&self.shared).provided
        }
    }

    impl TransportProvider for MockTransportProvider {
        fn get(&self, url: Url, timeout: Duration) -> HttpResult<Arc<dyn Transport>> {
            lock(&self.shared).provided += 1;
            Ok(Arc::new(MockTransport {
                url,
                timeout,
                shared: Arc::clone(&self.shared),
            }))
        }
    }

    struct MockTransport {
        url: Url,
        timeout: Duration,
        shared: Arc<Mutex<Shared>>,
    }

    impl MockTransport {
        fn record(&self, method: HttpMethod, body: Vec<u8>) -> HttpResult<HeaderAndBody> {
            let mut shared = lock(&self.shared);
            shared.requests.push(RecordedRequest {
                method,
                url: self.url.clone(),
                timeout: self.timeout,
                body,
            });
            let response = match shared.queued.pop_front() {
                Some(r) => r,
                None => shared
                    .fallback
                    .clone()
                    .unwrap_or_else(|| HeaderAndBody::new(200, Vec::new())),
            };
            if response.is_success() {
                Ok(response)
            } else {
                Err(HttpError::Status {
                    status: response.status,
                    body: response.body_text(),
                })
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        fn url(&self) -> &Url {
            &self.url
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn get(&self) -> HttpResult<HeaderAndBody> {
            self.record(HttpMethod::Get, Vec::new())
        }

        async fn post(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody> {
            self.record(HttpMethod::Post, body)
        }

        async fn put(&self, body: Vec<u8>) -> HttpResult<HeaderAndBody> {
            self.record(HttpMethod::Put, body)
        }

        async fn delete(&self) -> HttpResult<HeaderAndBody> {
            self.record(HttpMethod::Delete, Vec::new())
        }
    }
}
