//! Authentication for restpipe services.
//!
//! [`AuthSessionRunner`] resolves the login, logout and enroll endpoints
//! against a base URL once and issues the corresponding POST requests.
//! [`AuthenticationModule`] runs those requests in the background, reports
//! through a [`restpipe_pipeline::Callback`] and tracks the session state.
//!
//! Session tokens in the responses are not attached to later requests;
//! callers pass them on, for instance through
//! [`restpipe_http::HttpTransportProvider::set_default_header`].

mod config;
mod error;
mod module;
mod runner;

pub use config::AuthenticationConfig;
pub use error::{AuthError, AuthResult};
pub use module::AuthenticationModule;
pub use runner::AuthSessionRunner;
