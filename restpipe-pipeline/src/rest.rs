//! Generic REST-backed pipe handler.
//!
//! Maps the pipe capabilities onto a resource collection URL:
//! - read: `GET {base}/{endpoint}?{filter}`
//! - save: `POST {base}/{endpoint}` for new records, `PUT {base}/{endpoint}/{id}`
//!   for records that already carry an `id`
//! - remove: `DELETE {base}/{endpoint}/{id}`

use crate::config::PipeConfig;
use crate::error::{PipeError, PipeResult};
use crate::filter::ReadFilter;
use crate::handler::PipeHandler;
use async_trait::async_trait;
use restpipe_http::{TransportProvider, Url, append_path_segment};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Field read from a serialized record to decide between create and update.
pub const RECORD_ID_FIELD: &str = "id";

/// A [`PipeHandler`] speaking JSON to a REST collection.
pub struct RestPipeHandler<T> {
    config: PipeConfig,
    resource_url: Url,
    provider: Arc<dyn TransportProvider>,
    _record: PhantomData<fn() -> T>,
}

impl<T> RestPipeHandler<T> {
    /// Creates a handler, resolving the resource URL up front.
    pub fn new(config: PipeConfig, provider: Arc<dyn TransportProvider>) -> PipeResult<Self> {
        let resource_url = config
            .resource_url()
            .map_err(|e| PipeError::Config(format!("pipe {:?}: {e}", config.name)))?;
        Ok(Self {
            config,
            resource_url,
            provider,
            _record: PhantomData,
        })
    }

    /// The pipe configuration.
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    /// The resolved collection URL.
    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    fn record_url(&self, id: &str) -> PipeResult<Url> {
        Ok(append_path_segment(&self.resource_url, id)?)
    }
}

/// Extracts a record id (string or number) from a serialized record.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get(RECORD_ID_FIELD)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl<T> PipeHandler<T> for RestPipeHandler<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn on_read(&self, filter: ReadFilter) -> PipeResult<Vec<T>> {
        let mut url = self.resource_url.clone();
        filter.apply_to(&mut url);
        debug!(pipe = %self.config.name, %url, "reading");

        let transport = self.provider.get(url, self.config.timeout())?;
        let response = transport.get().await?;
        match response.json::<Value>()? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(PipeError::from))
                .collect(),
            single => Ok(vec![serde_json::from_value(single)?]),
        }
    }

    async fn on_save(&self, item: T) -> PipeResult<T> {
        let record = serde_json::to_value(&item)?;
        let body = serde_json::to_vec(&record)?;

        let response = match record_id(&record) {
            Some(id) => {
                let url = self.record_url(&id)?;
                debug!(pipe = %self.config.name, %id, "updating record");
                self.provider.get(url, self.config.timeout())?.put(body).await?
            }
            None => {
                debug!(pipe = %self.config.name, "creating record");
                self.provider
                    .get(self.resource_url.clone(), self.config.timeout())?
                    .post(body)
                    .await?
            }
        };

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(item);
        }
        Ok(response.json()?)
    }

    async fn on_remove(&self, id: &str) -> PipeResult<()> {
        let url = self.record_url(id)?;
        debug!(pipe = %self.config.name, %id, "removing record");
        self.provider.get(url, self.config.timeout())?.delete().await?;
        Ok(())
    }
}
