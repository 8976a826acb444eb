//! HTTP transport boundary for restpipe.
//!
//! The pipeline and authentication crates never talk to the network
//! directly. They ask a [`TransportProvider`] for a [`Transport`] bound to
//! one URL and timeout, then issue `get`/`post`/`put`/`delete` against it.
//!
//! - [`HttpTransportProvider`] is the default reqwest-backed implementation.
//! - [`mock::MockTransportProvider`] records requests for tests.
//! - [`append_to_base_url`] resolves endpoint paths against a base URL.

mod error;
mod http;
pub mod transport;
mod urls;

pub use error::{HttpError, HttpResult};
pub use http::{HttpConfig, HttpTransport, HttpTransportProvider};
pub use transport::{HeaderAndBody, HttpMethod, Transport, TransportProvider, mock};
pub use urls::{append_path_segment, append_to_base_url};

pub use url::Url;
