//! At-most-once request loader.
//!
//! A [`Loader`] wraps one operation (a read, save or remove) and runs it at
//! most once between resets:
//!
//! ```text
//!   NotStarted --start--> Running --done--> Completed(value)
//!        ^                   |       \---> Failed(error)
//!        |                   |                  |
//!        +------reset--------+------------------+
//! ```
//!
//! Subscribers arriving while the operation runs are queued; subscribers
//! arriving afterwards get the stored outcome replayed inline. Whatever the
//! operation does (return an error, panic) ends up in the outcome and is
//! delivered to the failure side of each subscriber, never to the caller of
//! [`Loader::start`].

use crate::callback::Callback;
use crate::error::{Outcome, PipeError, PipeResult, SharedError};
use crate::filter::ReadFilter;
use crate::handler::PipeHandler;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Operation<T> = Arc<dyn Fn() -> BoxFuture<'static, PipeResult<T>> + Send + Sync>;
type Subscriber<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

/// Observable execution state of a [`Loader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

enum Slot<T> {
    Idle,
    Running(Vec<Subscriber<T>>),
    Done(Outcome<T>),
}

struct Inner<T> {
    /// Bumped by every reset; a run only publishes into its own epoch.
    epoch: u64,
    slot: Slot<T>,
    /// Subscribers of runs that were reset while in flight.
    detached: Vec<(u64, Vec<Subscriber<T>>)>,
    executions: u64,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one operation at most once and replays its outcome.
pub struct Loader<T> {
    operation: Operation<T>,
    inner: Arc<Mutex<Inner<T>>>,
    runtime: Option<Handle>,
}

impl<T> Loader<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wraps an operation. Nothing runs until the first [`start`](Self::start).
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PipeResult<T>> + Send + 'static,
    {
        let operation: Operation<T> = Arc::new(move || operation().boxed());
        Self {
            operation,
            inner: Arc::new(Mutex::new(Inner {
                epoch: 0,
                slot: Slot::Idle,
                detached: Vec::new(),
                executions: 0,
            })),
            runtime: None,
        }
    }

    /// Runs the operation on `handle` instead of the runtime current at
    /// `start` time.
    #[must_use]
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// A loader saving `item` through `handler`.
    pub fn save(handler: Arc<dyn PipeHandler<T>>, item: T) -> Self {
        Self::new(move || {
            let handler = Arc::clone(&handler);
            let item = item.clone();
            async move { handler.on_save(item).await }
        })
    }

    /// Subscribes a success/failure pair.
    ///
    /// Starts the operation if it has never run (or was reset), queues the
    /// pair if it is running, and delivers the stored outcome inline if it
    /// has finished. Never blocks on the operation and never fails.
    pub fn start<S, F>(&self, on_success: S, on_failure: F)
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(SharedError) + Send + 'static,
    {
        self.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }));
    }

    /// Subscribes a [`Callback`]; see [`start`](Self::start).
    pub fn start_with(&self, callback: Arc<dyn Callback<T>>) {
        self.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => callback.on_success(value),
            Err(error) => callback.on_failure(error),
        }));
    }

    /// Subscribes and waits for the outcome.
    pub async fn load(&self) -> Outcome<T> {
        let (tx, rx) = oneshot::channel();
        self.subscribe(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        rx.await.unwrap_or_else(|_| Err(Arc::new(PipeError::Abandoned)))
    }

    /// Forgets the stored outcome so the next `start` runs the operation
    /// again. Subscribers waiting on an in-flight run still receive that
    /// run's outcome, but it is no longer stored.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        let epoch = inner.epoch;
        inner.epoch += 1;
        if let Slot::Running(waiters) = std::mem::replace(&mut inner.slot, Slot::Idle) {
            inner.detached.push((epoch, waiters));
        }
        debug!(epoch = inner.epoch, "loader reset");
    }

    /// The current execution state.
    pub fn state(&self) -> LoaderState {
        match &lock(&self.inner).slot {
            Slot::Idle => LoaderState::NotStarted,
            Slot::Running(_) => LoaderState::Running,
            Slot::Done(Ok(_)) => LoaderState::Completed,
            Slot::Done(Err(_)) => LoaderState::Failed,
        }
    }

    /// The stored outcome, if the operation has finished.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        match &lock(&self.inner).slot {
            Slot::Done(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// How many times the operation has been started over the loader's
    /// lifetime, resets included.
    pub fn executions(&self) -> u64 {
        lock(&self.inner).executions
    }

    fn subscribe(&self, subscriber: Subscriber<T>) {
        let mut inner = lock(&self.inner);
        if let Slot::Done(outcome) = &inner.slot {
            let outcome = outcome.clone();
            drop(inner);
            debug!("replaying stored outcome");
            deliver(vec![subscriber], outcome);
            return;
        }
        if let Slot::Running(waiters) = &mut inner.slot {
            waiters.push(subscriber);
            debug!(waiting = waiters.len(), "queued behind running operation");
            return;
        }

        inner.slot = Slot::Running(vec![subscriber]);
        inner.executions += 1;
        let epoch = inner.epoch;
        debug!(epoch, executions = inner.executions, "starting operation");
        drop(inner);
        self.spawn(epoch);
    }

    fn spawn(&self, epoch: u64) {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            warn!("no tokio runtime; failing operation without running it");
            finish(&self.inner, epoch, Err(Arc::new(PipeError::NoRuntime)));
            return;
        };

        let operation = Arc::clone(&self.operation);
        let run = RunGuard {
            inner: Some(Arc::clone(&self.inner)),
            epoch,
        };
        runtime.spawn(async move {
            let outcome = match AssertUnwindSafe(async move { operation().await })
                .catch_unwind()
                .await
            {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(Arc::new(error)),
                Err(panic) => Err(Arc::new(PipeError::Panicked(panic_message(panic.as_ref())))),
            };
            run.complete(outcome);
        });
    }
}

/// Owns a run's right to publish. Dropped unfinished (the task was cancelled
/// or its runtime shut down), it publishes [`PipeError::Abandoned`].
struct RunGuard<T: Clone> {
    inner: Option<Arc<Mutex<Inner<T>>>>,
    epoch: u64,
}

impl<T: Clone> RunGuard<T> {
    fn complete(mut self, outcome: Outcome<T>) {
        if let Some(inner) = self.inner.take() {
            finish(&inner, self.epoch, outcome);
        }
    }
}

impl<T: Clone> Drop for RunGuard<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            warn!(epoch = self.epoch, "operation dropped before completing");
            finish(&inner, self.epoch, Err(Arc::new(PipeError::Abandoned)));
        }
    }
}

impl<T> Loader<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    /// A loader reading through `handler` with `filter`.
    pub fn read(handler: Arc<dyn PipeHandler<T>>, filter: ReadFilter) -> Self {
        Self::new(move || {
            let handler = Arc::clone(&handler);
            let filter = filter.clone();
            async move { handler.on_read(filter).await }
        })
    }
}

impl Loader<()> {
    /// A loader removing record `id` through `handler`.
    pub fn remove<T>(handler: Arc<dyn PipeHandler<T>>, id: impl Into<String>) -> Self
    where
        T: Send + 'static,
    {
        let id = id.into();
        Self::new(move || {
            let handler = Arc::clone(&handler);
            let id = id.clone();
            async move { handler.on_remove(&id).await }
        })
    }
}

/// Publishes a run's outcome and hands it to that run's subscribers.
fn finish<T: Clone>(inner: &Mutex<Inner<T>>, epoch: u64, outcome: Outcome<T>) {
    let waiters = {
        let mut guard = lock(inner);
        if guard.epoch == epoch {
            match std::mem::replace(&mut guard.slot, Slot::Done(outcome.clone())) {
                Slot::Running(waiters) => waiters,
                _ => Vec::new(),
            }
        } else {
            debug!(epoch, current = guard.epoch, "discarding outcome of reset run");
            match guard.detached.iter().position(|(e, _)| *e == epoch) {
                Some(index) => guard.detached.swap_remove(index).1,
                None => Vec::new(),
            }
        }
    };
    match &outcome {
        Ok(_) => debug!(epoch, subscribers = waiters.len(), "operation completed"),
        Err(error) => debug!(epoch, subscribers = waiters.len(), %error, "operation failed"),
    }
    deliver(waiters, outcome);
}

fn deliver<T: Clone>(subscribers: Vec<Subscriber<T>>, outcome: Outcome<T>) {
    for subscriber in subscribers {
        let outcome = outcome.clone();
        let delivered = std::panic::catch_unwind(AssertUnwindSafe(move || subscriber(outcome)));
        if let Err(panic) = delivered {
            warn!(panic = %panic_message(panic.as_ref()), "callback panicked");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
