//! Table store backed by an object store.
//!
//! Each table is a directory. A marker object records that the table exists,
//! and each partition is stored as one JSON document holding all its rows.
//!
//! The `ObjectStoreFactory` trait creates the `ObjectStore` client for a
//! storage account, so that the same code runs against the local file system
//! during development and tests.

pub mod local;
pub mod paths;
mod table_store;

use std::sync::Arc;

use dashmap::DashMap;
use object_store::{ObjectStore, memory::InMemory};

pub use local::{LocalFileSystemFactory, TemporaryFileSystemFactory};
pub use table_store::{ObjectStoreTableHandle, ObjectStoreTableStore};

/// Factory trait for creating ObjectStore instances for a storage account.
#[async_trait::async_trait]
pub trait ObjectStoreFactory: Send + Sync {
    /// Create an ObjectStore instance for the named storage account.
    async fn create_object_store(
        &self,
        account: &str,
    ) -> Result<Arc<dyn ObjectStore>, object_store::Error>;
}

/// Factory for in-memory object stores.
///
/// The same account always maps to the same store, data is lost when the
/// factory is dropped.
#[derive(Default)]
pub struct InMemoryFactory {
    stores: DashMap<String, Arc<InMemory>>,
}

impl InMemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStoreFactory for InMemoryFactory {
    async fn create_object_store(
        &self,
        account: &str,
    ) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
        let store = self
            .stores
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone();

        Ok(store)
    }
}
