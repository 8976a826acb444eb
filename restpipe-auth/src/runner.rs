//! Auth request builder.

use crate::config::AuthenticationConfig;
use crate::error::{AuthError, AuthResult};
use restpipe_http::{HeaderAndBody, TransportProvider, Url, append_to_base_url};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Issues login, logout and enroll requests against fixed, pre-resolved URLs.
///
/// URLs are resolved once at construction; the runner is immutable after
/// that and can be shared freely. Requests are sent once, with no retry.
#[derive(Clone)]
pub struct AuthSessionRunner {
    base_url: Url,
    login_url: Url,
    logout_url: Url,
    enroll_url: Url,
    timeout: Duration,
    provider: Arc<dyn TransportProvider>,
}

impl fmt::Debug for AuthSessionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSessionRunner")
            .field("login_url", &self.login_url.as_str())
            .field("logout_url", &self.logout_url.as_str())
            .field("enroll_url", &self.enroll_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AuthSessionRunner {
    /// Resolves the three endpoints against `base_url`.
    ///
    /// Fails with [`AuthError::Config`] if any endpoint cannot be appended,
    /// for instance when the base carries a query or fragment.
    pub fn new(
        base_url: Url,
        config: &AuthenticationConfig,
        provider: Arc<dyn TransportProvider>,
    ) -> AuthResult<Self> {
        let resolve = |endpoint: &str| {
            append_to_base_url(&base_url, endpoint).map_err(|e| AuthError::Config(e.to_string()))
        };
        let login_url = resolve(&config.login_endpoint)?;
        let logout_url = resolve(&config.logout_endpoint)?;
        let enroll_url = resolve(&config.enroll_endpoint)?;

        Ok(Self {
            base_url,
            login_url,
            logout_url,
            enroll_url,
            timeout: config.timeout(),
            provider,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    pub fn enroll_url(&self) -> &Url {
        &self.enroll_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POSTs `{"username": .., "password": ..}` to the login URL.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<HeaderAndBody> {
        let body = serde_json::to_vec(&Credentials { username, password })?;
        debug!(url = %self.login_url, username, "Sending login request");
        self.post(&self.login_url, body).await
    }

    /// POSTs an empty body to the logout URL.
    pub async fn logout(&self) -> AuthResult<HeaderAndBody> {
        debug!(url = %self.logout_url, "Sending logout request");
        self.post(&self.logout_url, Vec::new()).await
    }

    /// POSTs `user_data` as a JSON object to the enroll URL.
    pub async fn enroll(&self, user_data: &BTreeMap<String, String>) -> AuthResult<HeaderAndBody> {
        let body = serde_json::to_vec(user_data)?;
        debug!(url = %self.enroll_url, fields = user_data.len(), "Sending enroll request");
        self.post(&self.enroll_url, body).await
    }

    async fn post(&self, url: &Url, body: Vec<u8>) -> AuthResult<HeaderAndBody> {
        let transport = self.provider.get(url.clone(), self.timeout)?;
        Ok(transport.post(body).await?)
    }
}
