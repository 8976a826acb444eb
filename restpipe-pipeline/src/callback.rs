//! Completion callbacks.

use crate::error::SharedError;
use std::sync::Arc;

/// Receives the outcome of a request.
///
/// Exactly one of the two methods is called, once, for each registration.
pub trait Callback<T>: Send + Sync {
    /// Called with the operation's result.
    fn on_success(&self, data: T);

    /// Called with the captured error.
    fn on_failure(&self, error: SharedError);
}

/// A [`Callback`] built from a pair of closures.
pub struct FnCallback<S, F> {
    on_success: S,
    on_failure: F,
}

impl<T, S, F> Callback<T> for FnCallback<S, F>
where
    S: Fn(T) + Send + Sync,
    F: Fn(SharedError) + Send + Sync,
{
    fn on_success(&self, data: T) {
        (self.on_success)(data);
    }

    fn on_failure(&self, error: SharedError) {
        (self.on_failure)(error);
    }
}

/// Wraps a pair of closures as a shareable callback.
pub fn callback_fn<T, S, F>(on_success: S, on_failure: F) -> Arc<dyn Callback<T>>
where
    T: 'static,
    S: Fn(T) + Send + Sync + 'static,
    F: Fn(SharedError) + Send + Sync + 'static,
{
    Arc::new(FnCallback {
        on_success,
        on_failure,
    })
}
