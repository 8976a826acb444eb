//! Named store registry.

use crate::error::StoreResult;
use crate::id::{DefaultIdGenerator, IdGenerator};
use crate::store::{DefaultStoreFactory, Store, StoreConfig, StoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Maps names to stores.
///
/// Registering a name that is already taken replaces the previous store.
/// Callers holding the old store keep a working handle to it.
pub struct DataManager {
    id_generator: Arc<dyn IdGenerator>,
    factory: Arc<dyn StoreFactory>,
    stores: RwLock<HashMap<String, Arc<dyn Store>>>,
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DataManager {
    /// A manager using UUID ids and in-memory stores.
    pub fn new() -> Self {
        Self::with(Arc::new(DefaultIdGenerator), Arc::new(DefaultStoreFactory))
    }

    pub fn with_id_generator(id_generator: Arc<dyn IdGenerator>) -> Self {
        Self::with(id_generator, Arc::new(DefaultStoreFactory))
    }

    pub fn with_store_factory(factory: Arc<dyn StoreFactory>) -> Self {
        Self::with(Arc::new(DefaultIdGenerator), factory)
    }

    pub fn with(id_generator: Arc<dyn IdGenerator>, factory: Arc<dyn StoreFactory>) -> Self {
        Self {
            id_generator,
            factory,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a default in-memory store under `name`.
    pub fn store(&self, name: &str) -> StoreResult<Arc<dyn Store>> {
        self.put(name, &StoreConfig::default())
    }

    /// Builds a store from `config` and registers it under `name`,
    /// replacing any existing entry. The factory runs before the map is
    /// touched, so a rejected config leaves the registry unchanged.
    pub fn put(&self, name: &str, config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
        let store = self
            .factory
            .create_store(config, Arc::clone(&self.id_generator))?;
        let previous = self
            .stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&store));
        if previous.is_some() {
            info!(name, store_type = %config.store_type, "replaced store");
        } else {
            debug!(name, store_type = %config.store_type, "registered store");
        }
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Store>> {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Unregisters `name`, returning its store.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Store>> {
        let removed = self
            .stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_some() {
            debug!(name, "removed store");
        }
        removed
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
