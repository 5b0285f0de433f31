//! In-memory implementation of the table store.
//!
//! This implementation keeps all tables in memory and is suitable for testing
//! and development. It uses a RwLock for thread-safe access, batches are
//! applied under a single write lock.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use strata_core::{
    Batch, ItemResult, PartitionRows, StoredEntity, TableHandle, TableName, TableStore,
    TableStoreError, WriteOperation,
    table::{Result, partition::validate_batch},
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod metrics;

use self::metrics::TableStoreMetrics;

#[derive(Debug, Default)]
struct Tables {
    /// Map of table storage key to table data.
    tables: HashMap<String, Partitions>,
}

#[derive(Debug, Default)]
struct Partitions {
    /// Map of partition key to the rows in that partition.
    partitions: HashMap<String, PartitionRows>,
}

impl Partitions {
    fn row_count(&self) -> usize {
        self.partitions.values().map(PartitionRows::len).sum()
    }
}

/// In-memory implementation of the table store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableStore {
    inner: Arc<RwLock<Tables>>,
    metrics: Arc<TableStoreMetrics>,
}

#[derive(Debug)]
pub struct InMemoryTableHandle {
    name: TableName,
    inner: Arc<RwLock<Tables>>,
    metrics: Arc<TableStoreMetrics>,
}

impl InMemoryTableStore {
    /// Create a new, empty, in-memory table store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows in the table, or `None` if it doesn't exist.
    pub async fn row_count(&self, name: &TableName) -> Option<usize> {
        let tables = self.inner.read().await;
        tables
            .tables
            .get(&name.storage_key())
            .map(Partitions::row_count)
    }

    /// Returns the storage keys of all tables, sorted.
    pub async fn table_names(&self) -> Vec<String> {
        let tables = self.inner.read().await;
        let mut names: Vec<_> = tables.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

impl TableStore for InMemoryTableStore {
    fn table(&self, name: &TableName) -> Arc<dyn TableHandle> {
        Arc::new(InMemoryTableHandle {
            name: name.clone(),
            inner: self.inner.clone(),
            metrics: self.metrics.clone(),
        })
    }
}

impl InMemoryTableHandle {
    fn key(&self) -> String {
        self.name.storage_key()
    }

    fn not_found(&self) -> TableStoreError {
        TableStoreError::TableNotFound {
            table: self.name.clone(),
        }
    }
}

#[async_trait]
impl TableHandle for InMemoryTableHandle {
    fn name(&self) -> &TableName {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        let tables = self.inner.read().await;
        Ok(tables.tables.contains_key(&self.key()))
    }

    async fn ensure_exists(&self) -> Result<()> {
        let mut tables = self.inner.write().await;
        if tables.tables.contains_key(&self.key()) {
            return Ok(());
        }

        debug!(table = %self.name, "creating table");
        tables.tables.insert(self.key(), Partitions::default());
        self.metrics.tables_count.add(1, &[]);

        Ok(())
    }

    async fn delete_table(&self) -> Result<()> {
        let mut tables = self.inner.write().await;
        let table = tables.tables.remove(&self.key()).ok_or_else(|| self.not_found())?;

        self.metrics.tables_count.add(-1, &[]);
        self.metrics.rows_count.add(-(table.row_count() as i64), &[]);

        Ok(())
    }

    async fn retrieve(&self, partition_key: &str, row_key: &str) -> Result<Option<StoredEntity>> {
        let tables = self.inner.read().await;
        let table = tables.tables.get(&self.key()).ok_or_else(|| self.not_found())?;

        Ok(table
            .partitions
            .get(partition_key)
            .and_then(|rows| rows.get(row_key))
            .cloned())
    }

    async fn submit(&self, operation: WriteOperation, ct: CancellationToken) -> Result<ItemResult> {
        if ct.is_cancelled() {
            return Err(TableStoreError::Cancelled);
        }

        let mut tables = self.inner.write().await;
        let table = tables
            .tables
            .get_mut(&self.key())
            .ok_or_else(|| self.not_found())?;

        let rows = table
            .partitions
            .entry(operation.partition_key().to_string())
            .or_default();

        let before = rows.len();
        let result = rows.apply(&self.name, &operation);
        self.metrics
            .rows_count
            .add(rows.len() as i64 - before as i64, &[]);

        Ok(result)
    }

    async fn submit_batch(&self, batch: Batch, ct: CancellationToken) -> Result<Vec<ItemResult>> {
        validate_batch(&self.name, &batch)?;

        if ct.is_cancelled() {
            return Err(TableStoreError::Cancelled);
        }

        let mut tables = self.inner.write().await;
        let table = tables
            .tables
            .get_mut(&self.key())
            .ok_or_else(|| self.not_found())?;

        let rows = table.partitions.entry(batch.partition_key).or_default();

        let before = rows.len();
        let results = rows.apply_batch(&self.name, &batch.operations);
        self.metrics
            .rows_count
            .add(rows.len() as i64 - before as i64, &[]);

        debug!(
            table = %self.name,
            operations = batch.operations.len(),
            results = results.len(),
            "applied batch"
        );

        Ok(results)
    }
}
