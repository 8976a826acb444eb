//! Record id generation.

use uuid::Uuid;

/// Produces ids for records saved without one.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdGenerator;

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
