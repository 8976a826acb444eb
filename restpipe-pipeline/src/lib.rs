//! Asynchronous, at-most-once data access for REST resources.
//!
//! # Architecture
//!
//! - **PipeHandler**: the read/save/remove capability set of one resource
//!   ([`RestPipeHandler`] speaks JSON over a [`restpipe_http::Transport`])
//! - **Loader**: runs one handler operation at most once on a tokio task and
//!   replays the stored outcome to late subscribers
//! - **CallbackRegistry**: maps a [`RequestIdentity`] to its pending request
//!   so re-registration joins instead of re-executing
//! - **LoaderPipe**: a named pipe tying the three together
//!
//! # Example
//!
//! ```no_run
//! use restpipe_http::{HttpTransportProvider, Url};
//! use restpipe_pipeline::{LoaderPipe, PipeConfig, ReadFilter, callback_fn};
//! use restpipe_types::identity;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipeConfig::new(Url::parse("https://api.example.org/")?, "widgets");
//! let provider = Arc::new(HttpTransportProvider::new()?);
//! let pipe = LoaderPipe::<serde_json::Value>::rest(config, provider)?;
//!
//! pipe.read(
//!     ReadFilter::new().limit(10),
//!     &identity!("widget-list"),
//!     callback_fn(
//!         |widgets: Vec<serde_json::Value>| println!("{} widgets", widgets.len()),
//!         |error| eprintln!("read failed: {error}"),
//!     ),
//! );
//! # Ok(())
//! # }
//! ```

mod callback;
mod config;
mod error;
mod filter;
mod handler;
mod loader;
mod pipe;
mod registry;
pub mod rest;

pub use callback::{Callback, FnCallback, callback_fn};
pub use config::{DEFAULT_TIMEOUT_MS, PipeConfig, PipeType, simple_type_name};
pub use error::{ErrorKind, Outcome, PipeError, PipeResult, SharedError};
pub use filter::ReadFilter;
pub use handler::PipeHandler;
pub use loader::{Loader, LoaderState};
pub use pipe::LoaderPipe;
pub use registry::{CallbackRegistry, RequestHandle};
pub use rest::RestPipeHandler;

pub use restpipe_types::RequestIdentity;
