//! Loader-backed pipes.

use crate::callback::Callback;
use crate::config::PipeConfig;
use crate::error::PipeResult;
use crate::filter::ReadFilter;
use crate::handler::PipeHandler;
use crate::loader::Loader;
use crate::registry::{CallbackRegistry, RequestHandle};
use crate::rest::RestPipeHandler;
use restpipe_http::TransportProvider;
use restpipe_types::{IdentityPart, RequestIdentity};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A named pipe whose operations run through loaders.
///
/// Each call is keyed by the pipe name, the operation, the operation's own
/// parameters (filter, record id) and a caller-supplied `key`. Calling again
/// with the same key joins the earlier request: while it runs the callback
/// is queued, once it finished the stored outcome is replayed. Pass a
/// different key to force a separate request, or [`reset`](Self::reset) the
/// pipe to drop every stored outcome.
pub struct LoaderPipe<T> {
    name: String,
    handler: Arc<dyn PipeHandler<T>>,
    reads: CallbackRegistry<Vec<T>>,
    saves: CallbackRegistry<T>,
    removes: CallbackRegistry<()>,
}

impl<T> LoaderPipe<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// A pipe backed by [`RestPipeHandler`].
    pub fn rest(config: PipeConfig, provider: Arc<dyn TransportProvider>) -> PipeResult<Self> {
        let name = config.name.clone();
        let handler = RestPipeHandler::<T>::new(config, provider)?;
        Ok(Self::new(name, Arc::new(handler)))
    }
}

impl<T> LoaderPipe<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A pipe over any handler.
    pub fn new(name: impl Into<String>, handler: Arc<dyn PipeHandler<T>>) -> Self {
        Self {
            name: name.into(),
            handler,
            reads: CallbackRegistry::new(),
            saves: CallbackRegistry::new(),
            removes: CallbackRegistry::new(),
        }
    }

    /// The pipe name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity a read would be registered under.
    pub fn read_identity(&self, filter: &ReadFilter, key: &RequestIdentity) -> RequestIdentity {
        self.identity("read", IdentityPart::from(filter), key)
    }

    /// The identity a save would be registered under.
    pub fn save_identity(&self, key: &RequestIdentity) -> RequestIdentity {
        self.identity("save", IdentityPart::Null, key)
    }

    /// The identity a remove would be registered under.
    pub fn remove_identity(&self, id: &str, key: &RequestIdentity) -> RequestIdentity {
        self.identity("remove", IdentityPart::from(id), key)
    }

    /// Reads the records matching `filter`.
    pub fn read(
        &self,
        filter: ReadFilter,
        key: &RequestIdentity,
        callback: Arc<dyn Callback<Vec<T>>>,
    ) -> RequestHandle {
        let identity = self.read_identity(&filter, key);
        let handler = Arc::clone(&self.handler);
        self.reads
            .register(identity, callback, move || Loader::read(handler, filter))
    }

    /// Saves `item`. Re-registering with the same key replays the first
    /// save's result rather than saving the new item.
    pub fn save(
        &self,
        item: T,
        key: &RequestIdentity,
        callback: Arc<dyn Callback<T>>,
    ) -> RequestHandle {
        let identity = self.save_identity(key);
        let handler = Arc::clone(&self.handler);
        self.saves
            .register(identity, callback, move || Loader::save(handler, item))
    }

    /// Removes the record with id `id`.
    pub fn remove(
        &self,
        id: &str,
        key: &RequestIdentity,
        callback: Arc<dyn Callback<()>>,
    ) -> RequestHandle {
        let identity = self.remove_identity(id, key);
        let handler = Arc::clone(&self.handler);
        let id = id.to_string();
        self.removes
            .register(identity, callback, move || Loader::remove(handler, id))
    }

    /// Detaches a callback registered through this pipe.
    pub fn unregister(&self, handle: &RequestHandle) -> bool {
        self.reads.unregister(handle)
            || self.saves.unregister(handle)
            || self.removes.unregister(handle)
    }

    /// Drops every stored outcome. Requests in flight still complete for
    /// the callbacks attached to them.
    pub fn reset(&self) {
        self.reads.clear();
        self.saves.clear();
        self.removes.clear();
    }

    /// Access to the read registry.
    pub fn reads(&self) -> &CallbackRegistry<Vec<T>> {
        &self.reads
    }

    /// Access to the save registry.
    pub fn saves(&self) -> &CallbackRegistry<T> {
        &self.saves
    }

    /// Access to the remove registry.
    pub fn removes(&self) -> &CallbackRegistry<()> {
        &self.removes
    }

    fn identity(
        &self,
        operation: &str,
        params: IdentityPart,
        key: &RequestIdentity,
    ) -> RequestIdentity {
        RequestIdentity::default()
            .with(self.name.as_str())
            .with(operation)
            .with(params)
            .extended(key)
    }
}
