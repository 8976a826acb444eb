use crate::error::PipeResult;
use crate::filter::ReadFilter;
use async_trait::async_trait;

/// The capability set behind a pipe: read, save and remove against one
/// named resource.
///
/// Implementations may fail freely. Errors are captured by the
/// [`Loader`](crate::Loader) running the operation and routed to the
/// failure callback; they never reach whoever registered the request.
#[async_trait]
pub trait PipeHandler<T: Send + 'static>: Send + Sync {
    /// Loads the records matching `filter`. Either every record is returned
    /// or the call fails; partial results are never produced.
    async fn on_read(&self, filter: ReadFilter) -> PipeResult<Vec<T>>;

    /// Persists `item` and returns the stored representation, which may
    /// differ from the input (server-assigned ids, timestamps).
    async fn on_save(&self, item: T) -> PipeResult<T>;

    /// Removes the record with the given id.
    async fn on_remove(&self, id: &str) -> PipeResult<()>;
}
