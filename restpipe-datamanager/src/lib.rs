//! Named local stores.
//!
//! A [`DataManager`] is an explicitly constructed registry mapping names to
//! [`Store`]s. Stores are built by a pluggable [`StoreFactory`]; the default
//! factory only knows [`MemoryStore`]. Records are JSON objects, and a
//! record saved without an id gets one from the manager's [`IdGenerator`].

mod error;
mod id;
mod manager;
mod store;

pub use error::{StoreError, StoreResult};
pub use id::{DefaultIdGenerator, IdGenerator};
pub use manager::DataManager;
pub use store::{DefaultStoreFactory, MemoryStore, Store, StoreConfig, StoreFactory, StoreType};
