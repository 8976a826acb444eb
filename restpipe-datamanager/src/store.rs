//! Local record stores.

use crate::error::{StoreError, StoreResult};
use crate::id::IdGenerator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Backing kind of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Memory,
    Sql,
    EncryptedMemory,
    EncryptedSql,
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreType::Memory => "MEMORY",
            StoreType::Sql => "SQL",
            StoreType::EncryptedMemory => "ENCRYPTED_MEMORY",
            StoreType::EncryptedSql => "ENCRYPTED_SQL",
        };
        f.write_str(name)
    }
}

/// How a store is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub store_type: StoreType,
    /// Record field holding the id.
    pub id_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Memory,
            id_field: "id".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(store_type: StoreType) -> Self {
        Self {
            store_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }
}

/// A local collection of JSON records keyed by id.
pub trait Store: Send + Sync {
    fn store_type(&self) -> StoreType;

    /// Every record, ordered by id.
    fn read_all(&self) -> Vec<Value>;

    fn read(&self, id: &str) -> Option<Value>;

    /// Inserts or replaces `record`, assigning an id if it has none.
    /// Returns the record as stored.
    fn save(&self, record: Value) -> StoreResult<Value>;

    /// Removes a record, returning it if it was present.
    fn remove(&self, id: &str) -> Option<Value>;

    /// Drops every record.
    fn reset(&self);

    fn is_empty(&self) -> bool;
}

/// Keeps records in a map for the life of the process.
pub struct MemoryStore {
    id_field: String,
    id_generator: Arc<dyn IdGenerator>,
    records: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new(config: &StoreConfig, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            id_field: config.id_field.clone(),
            id_generator,
            records: Mutex::new(BTreeMap::new()),
        }
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }

    fn read_all(&self) -> Vec<Value> {
        self.records().values().cloned().collect()
    }

    fn read(&self, id: &str) -> Option<Value> {
        self.records().get(id).cloned()
    }

    fn save(&self, mut record: Value) -> StoreResult<Value> {
        let object = record.as_object_mut().ok_or(StoreError::NotAnObject)?;
        let id = match object.get(&self.id_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(StoreError::InvalidId {
                    field: self.id_field.clone(),
                    value: other.clone(),
                });
            }
        };
        let id = match id {
            Some(id) => id,
            None => {
                let id = self.id_generator.generate();
                debug!(%id, "assigned record id");
                object.insert(self.id_field.clone(), Value::String(id.clone()));
                id
            }
        };

        self.records().insert(id, record.clone());
        Ok(record)
    }

    fn remove(&self, id: &str) -> Option<Value> {
        self.records().remove(id)
    }

    fn reset(&self) {
        self.records().clear();
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Builds stores from configs.
pub trait StoreFactory: Send + Sync {
    fn create_store(
        &self,
        config: &StoreConfig,
        id_generator: Arc<dyn IdGenerator>,
    ) -> StoreResult<Arc<dyn Store>>;
}

/// Builds [`MemoryStore`]s and rejects every other type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStoreFactory;

impl StoreFactory for DefaultStoreFactory {
    fn create_store(
        &self,
        config: &StoreConfig,
        id_generator: Arc<dyn IdGenerator>,
    ) -> StoreResult<Arc<dyn Store>> {
        match config.store_type {
            StoreType::Memory => Ok(Arc::new(MemoryStore::new(config, id_generator))),
            other => Err(StoreError::UnsupportedType(other)),
        }
    }
}
