//! Authentication endpoint configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint paths (relative to the service base URL) and request timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    pub login_endpoint: String,
    pub logout_endpoint: String,
    pub enroll_endpoint: String,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            login_endpoint: "auth/login".to_string(),
            logout_endpoint: "auth/logout".to_string(),
            enroll_endpoint: "auth/enroll".to_string(),
            timeout_ms: 60_000,
        }
    }
}

impl AuthenticationConfig {
    #[must_use]
    pub fn with_login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_logout_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.logout_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_enroll_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.enroll_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
