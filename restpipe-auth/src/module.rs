//! Callback-driven authentication.

use crate::runner::AuthSessionRunner;
use restpipe_http::HeaderAndBody;
use restpipe_pipeline::{Callback, Loader, PipeError, SharedError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Runs [`AuthSessionRunner`] requests in the background and tracks whether
/// the session is logged in.
///
/// A successful login or enroll marks the session logged in; a successful
/// logout clears it. Failures leave the flag untouched.
pub struct AuthenticationModule {
    runner: Arc<AuthSessionRunner>,
    logged_in: Arc<AtomicBool>,
}

/// Updates the session flag before handing the outcome on.
struct SessionCallback {
    logged_in: Arc<AtomicBool>,
    on_success: bool,
    operation: &'static str,
    inner: Arc<dyn Callback<HeaderAndBody>>,
}

impl Callback<HeaderAndBody> for SessionCallback {
    fn on_success(&self, data: HeaderAndBody) {
        self.logged_in.store(self.on_success, Ordering::SeqCst);
        info!(operation = self.operation, status = data.status, "Auth request succeeded");
        self.inner.on_success(data);
    }

    fn on_failure(&self, error: SharedError) {
        warn!(operation = self.operation, error = %error, "Auth request failed");
        self.inner.on_failure(error);
    }
}

impl AuthenticationModule {
    pub fn new(runner: AuthSessionRunner) -> Self {
        Self {
            runner: Arc::new(runner),
            logged_in: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn runner(&self) -> &AuthSessionRunner {
        &self.runner
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    /// Logs in; the outcome arrives on `callback`.
    pub fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        callback: Arc<dyn Callback<HeaderAndBody>>,
    ) {
        let runner = Arc::clone(&self.runner);
        let username = username.into();
        let password = password.into();
        let loader = Loader::new(move || {
            let runner = Arc::clone(&runner);
            let username = username.clone();
            let password = password.clone();
            async move {
                runner
                    .login(&username, &password)
                    .await
                    .map_err(PipeError::from)
            }
        });
        loader.start_with(self.session_callback("login", true, callback));
    }

    /// Logs out; the outcome arrives on `callback`.
    pub fn logout(&self, callback: Arc<dyn Callback<HeaderAndBody>>) {
        let runner = Arc::clone(&self.runner);
        let loader = Loader::new(move || {
            let runner = Arc::clone(&runner);
            async move { runner.logout().await.map_err(PipeError::from) }
        });
        loader.start_with(self.session_callback("logout", false, callback));
    }

    /// Enrolls a new user; the outcome arrives on `callback`.
    pub fn enroll(
        &self,
        user_data: BTreeMap<String, String>,
        callback: Arc<dyn Callback<HeaderAndBody>>,
    ) {
        let runner = Arc::clone(&self.runner);
        let loader = Loader::new(move || {
            let runner = Arc::clone(&runner);
            let user_data = user_data.clone();
            async move { runner.enroll(&user_data).await.map_err(PipeError::from) }
        });
        loader.start_with(self.session_callback("enroll", true, callback));
    }

    fn session_callback(
        &self,
        operation: &'static str,
        on_success: bool,
        inner: Arc<dyn Callback<HeaderAndBody>>,
    ) -> Arc<dyn Callback<HeaderAndBody>> {
        Arc::new(SessionCallback {
            logged_in: Arc::clone(&self.logged_in),
            on_success,
            operation,
            inner,
        })
    }
}
