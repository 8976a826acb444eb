//! Identity-aware callback registry.
//!
//! Registrations are keyed by [`RequestIdentity`]. A second registration
//! under an identity that is already running, or already holds a result,
//! joins the existing [`Loader`] instead of creating a new one, so a caller
//! that drops and re-attaches (a view being rebuilt, a retrying client) never
//! issues the network call twice.

use crate::callback::Callback;
use crate::loader::{Loader, LoaderState, lock};
use restpipe_types::RequestIdentity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Subscriber ids are unique process-wide so a handle can be offered to any
/// registry without colliding.
static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(1);

/// Identifies one registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestHandle {
    identity: RequestIdentity,
    subscriber: u64,
}

impl RequestHandle {
    /// The identity the callback was registered under.
    pub fn identity(&self) -> &RequestIdentity {
        &self.identity
    }
}

type Subscribers<T> = Arc<Mutex<HashMap<u64, Arc<dyn Callback<T>>>>>;

/// One tracked logical operation and the callbacks waiting on it.
struct PendingRequest<T> {
    loader: Loader<T>,
    subscribers: Subscribers<T>,
}

impl<T> PendingRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn attach(&self, subscriber: u64, callback: Arc<dyn Callback<T>>) {
        lock(&self.subscribers).insert(subscriber, callback);

        let on_success = Arc::clone(&self.subscribers);
        let on_failure = Arc::clone(&self.subscribers);
        self.loader.start(
            move |value| {
                let callback = lock(&on_success).remove(&subscriber);
                if let Some(callback) = callback {
                    callback.on_success(value);
                }
            },
            move |error| {
                let callback = lock(&on_failure).remove(&subscriber);
                if let Some(callback) = callback {
                    callback.on_failure(error);
                }
            },
        );
    }

    /// Joinable while running or holding a result; a failed request is
    /// replaced on the next registration.
    fn is_joinable(&self) -> bool {
        self.loader.state() != LoaderState::Failed
    }
}

/// Maps request identities to pending requests.
pub struct CallbackRegistry<T> {
    pending: Mutex<HashMap<RequestIdentity, Arc<PendingRequest<T>>>>,
}

impl<T> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> CallbackRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `identity`.
    ///
    /// Joins the existing request for `identity` when it is running or has
    /// a stored result (delivered inline). Otherwise builds a loader with
    /// `operation` and starts it. Never blocks and never fails.
    pub fn register<F>(
        &self,
        identity: RequestIdentity,
        callback: Arc<dyn Callback<T>>,
        operation: F,
    ) -> RequestHandle
    where
        F: FnOnce() -> Loader<T>,
    {
        let subscriber = NEXT_SUBSCRIBER.fetch_add(1, Ordering::Relaxed);
        let pending = {
            let mut pending = lock(&self.pending);
            match pending.get(&identity).filter(|p| p.is_joinable()) {
                Some(existing) => {
                    debug!(%identity, subscriber, "joining pending request");
                    Arc::clone(existing)
                }
                None => {
                    debug!(%identity, subscriber, "creating pending request");
                    let created = Arc::new(PendingRequest {
                        loader: operation(),
                        subscribers: Arc::new(Mutex::new(HashMap::new())),
                    });
                    pending.insert(identity.clone(), Arc::clone(&created));
                    created
                }
            }
        };

        // Attached outside the map lock: a stored outcome is delivered
        // inline and the callback may re-enter the registry.
        pending.attach(subscriber, callback);
        RequestHandle {
            identity,
            subscriber,
        }
    }

    /// Detaches a callback. The request itself keeps running for any other
    /// subscribers. Returns false if the callback was already delivered or
    /// detached.
    pub fn unregister(&self, handle: &RequestHandle) -> bool {
        let pending = lock(&self.pending).get(&handle.identity).cloned();
        let removed = pending
            .is_some_and(|p| lock(&p.subscribers).remove(&handle.subscriber).is_some());
        if removed {
            debug!(
                identity = %handle.identity,
                subscriber = handle.subscriber,
                "callback detached"
            );
        }
        removed
    }

    /// Resets the loader behind `identity` so the next registration runs the
    /// operation again. Returns false for unknown identities.
    pub fn reset(&self, identity: &RequestIdentity) -> bool {
        let pending = lock(&self.pending).get(identity).cloned();
        match pending {
            Some(p) => {
                p.loader.reset();
                true
            }
            None => false,
        }
    }

    /// Drops the pending request for `identity`. In-flight work still
    /// reaches the callbacks already attached to it.
    pub fn forget(&self, identity: &RequestIdentity) -> bool {
        lock(&self.pending).remove(identity).is_some()
    }

    /// Drops every pending request.
    pub fn clear(&self) {
        lock(&self.pending).clear();
    }

    /// The execution state of the request for `identity`.
    pub fn state(&self, identity: &RequestIdentity) -> Option<LoaderState> {
        let pending = lock(&self.pending).get(identity).cloned();
        pending.map(|p| p.loader.state())
    }

    /// How many times the request for `identity` has executed.
    pub fn executions(&self, identity: &RequestIdentity) -> Option<u64> {
        let pending = lock(&self.pending).get(identity).cloned();
        pending.map(|p| p.loader.executions())
    }

    /// Callbacks still waiting on the request for `identity`.
    pub fn subscriber_count(&self, identity: &RequestIdentity) -> usize {
        let pending = lock(&self.pending).get(identity).cloned();
        pending.map_or(0, |p| lock(&p.subscribers).len())
    }

    /// Number of tracked requests.
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.pending).is_empty()
    }
}
