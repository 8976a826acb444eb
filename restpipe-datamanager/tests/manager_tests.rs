use pretty_assertions::assert_eq;
use restpipe_datamanager::{
    DataManager, IdGenerator, MemoryStore, Store, StoreConfig, StoreError, StoreFactory,
    StoreResult, StoreType,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out `id-1`, `id-2`, ...
#[derive(Default)]
struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Accepts every type by building memory stores, counting calls.
#[derive(Default)]
struct PermissiveFactory {
    created: AtomicUsize,
}

impl StoreFactory for PermissiveFactory {
    fn create_store(
        &self,
        config: &StoreConfig,
        id_generator: Arc<dyn IdGenerator>,
    ) -> StoreResult<Arc<dyn Store>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemoryStore::new(config, id_generator)))
    }
}

// ── Registry ────────────────────────────────────────────────────

#[test]
fn put_get_remove_return_the_same_store() {
    let manager = DataManager::new();
    let store = manager.store("widgets").unwrap();

    let fetched = manager.get("widgets").unwrap();
    assert!(Arc::ptr_eq(&store, &fetched));

    let removed = manager.remove("widgets").unwrap();
    assert!(Arc::ptr_eq(&store, &removed));
    assert!(manager.get("widgets").is_none());
    assert!(manager.remove("widgets").is_none());
}

#[test]
fn reregistering_a_name_replaces_the_store() {
    let manager = DataManager::new();
    let first = manager.store("widgets").unwrap();
    first
        .save(serde_json::json!({"id": "1", "name": "old"}))
        .unwrap();

    let second = manager.store("widgets").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&second, &manager.get("widgets").unwrap()));
    assert!(second.is_empty());
    // The old handle still works.
    assert_eq!(first.read_all().len(), 1);
    assert_eq!(manager.len(), 1);
}

#[test]
fn names_are_sorted() {
    let manager = DataManager::new();
    for name in ["tasks", "notes", "widgets"] {
        manager.store(name).unwrap();
    }
    assert_eq!(manager.names(), vec!["notes", "tasks", "widgets"]);
    assert!(!manager.is_empty());
}

#[test]
fn unsupported_type_is_rejected_without_touching_registry() {
    let manager = DataManager::new();
    let existing = manager.store("widgets").unwrap();

    let result = manager.put("widgets", &StoreConfig::new(StoreType::Sql));
    assert!(matches!(
        result,
        Err(StoreError::UnsupportedType(StoreType::Sql))
    ));
    assert!(Arc::ptr_eq(&existing, &manager.get("widgets").unwrap()));
}

#[test]
fn custom_factory_is_used() {
    let factory = Arc::new(PermissiveFactory::default());
    let manager = DataManager::with_store_factory(factory.clone());

    manager
        .put("secure", &StoreConfig::new(StoreType::EncryptedMemory))
        .unwrap();
    manager.store("plain").unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
}

#[test]
fn custom_id_generator_reaches_stores() {
    let manager = DataManager::with_id_generator(Arc::new(SequentialIds::default()));
    let a = manager.store("a").unwrap();
    let b = manager.store("b").unwrap();

    let first = a.save(serde_json::json!({"n": 1})).unwrap();
    let second = b.save(serde_json::json!({"n": 2})).unwrap();
    assert_eq!(first["id"], "id-1");
    assert_eq!(second["id"], "id-2");
}

#[test]
fn manager_is_shareable_across_threads() {
    let manager = Arc::new(DataManager::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                manager.store(&format!("store-{}", i % 4)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(manager.len(), 4);
}

#[test]
fn store_config_from_json() {
    let config: StoreConfig =
        serde_json::from_value(serde_json::json!({"type": "encrypted_sql"})).unwrap();
    assert_eq!(config.store_type, StoreType::EncryptedSql);
    assert_eq!(config.id_field, "id");
    assert_eq!(StoreType::EncryptedSql.to_string(), "ENCRYPTED_SQL");
}
