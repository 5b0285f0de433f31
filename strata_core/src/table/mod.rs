//! Table store contracts.

mod cache;
pub mod error;
mod operation;
pub mod partition;
mod result;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::resources::TableName;

pub use self::{
    cache::{CacheOptions, TableCache},
    error::{Result, TableStoreError},
    operation::{Batch, MAX_BATCH_OPERATIONS, OperationKind, WriteOperation},
    partition::{PartitionRows, StoredEntity},
    result::ItemResult,
};

/// Resolves table names to handles on a remote table store.
pub trait TableStore: Send + Sync {
    /// Returns a handle to the named table.
    ///
    /// Resolving a handle does not touch the store. Use
    /// [`TableHandle::ensure_exists`] before writing.
    fn table(&self, name: &TableName) -> Arc<dyn TableHandle>;
}

/// A handle to a single table.
///
/// Errors returned by the handle are transport-level. Row-level failures
/// are reported through the status of each [`ItemResult`].
///
/// Writes check the cancellation token before they start. A write that
/// already started always completes.
#[async_trait]
pub trait TableHandle: Send + Sync {
    fn name(&self) -> &TableName;

    async fn exists(&self) -> Result<bool>;

    /// Create the table if it doesn't exist.
    async fn ensure_exists(&self) -> Result<()>;

    /// Delete the table and all its rows.
    async fn delete_table(&self) -> Result<()>;

    /// Point read of a single row.
    async fn retrieve(&self, partition_key: &str, row_key: &str) -> Result<Option<StoredEntity>>;

    async fn submit(&self, operation: WriteOperation, ct: CancellationToken)
    -> Result<ItemResult>;

    /// Apply all operations of a batch atomically.
    async fn submit_batch(&self, batch: Batch, ct: CancellationToken) -> Result<Vec<ItemResult>>;
}
