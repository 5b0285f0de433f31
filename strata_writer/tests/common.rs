#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use http::StatusCode;
use strata_core::{
    Batch, ChangeKind, Entity, ItemResult, PendingChange, StoredEntity, TableHandle, TableName,
    TableStore, TableStoreError, WriteOperation, table::Result,
};
use strata_memory::InMemoryTableStore;
use tokio_util::sync::CancellationToken;

/// Table store that wraps the in-memory store and misbehaves on request.
#[derive(Clone, Default)]
pub struct ScriptedTableStore {
    inner: InMemoryTableStore,
    script: Arc<Script>,
}

#[derive(Default)]
struct Script {
    /// Tables whose `ensure_exists` fails.
    unavailable_tables: Mutex<HashMap<String, TableStoreError>>,
    /// Tables whose submissions fail with a transport error.
    failing_tables: Mutex<HashMap<String, TableStoreError>>,
    /// Rows the store rejects with the given status.
    rejected_rows: Mutex<HashMap<String, StatusCode>>,
    /// Tokens cancelled when the table is first resolved.
    cancel_on_ensure: Mutex<HashMap<String, CancellationToken>>,
    submissions: AtomicUsize,
    ensured: Mutex<HashSet<String>>,
}

pub struct ScriptedTableHandle {
    inner: Arc<dyn TableHandle>,
    script: Arc<Script>,
}

impl ScriptedTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryTableStore {
        &self.inner
    }

    pub fn with_unavailable_table(self, table: &str, error: TableStoreError) -> Self {
        lock(&self.script.unavailable_tables).insert(table.to_ascii_lowercase(), error);
        self
    }

    pub fn with_failing_table(self, table: &str, error: TableStoreError) -> Self {
        lock(&self.script.failing_tables).insert(table.to_ascii_lowercase(), error);
        self
    }

    pub fn with_rejected_row(self, row_key: &str, status: StatusCode) -> Self {
        lock(&self.script.rejected_rows).insert(row_key.to_string(), status);
        self
    }

    pub fn with_cancel_on_ensure(self, table: &str, ct: CancellationToken) -> Self {
        lock(&self.script.cancel_on_ensure).insert(table.to_ascii_lowercase(), ct);
        self
    }

    /// Number of submissions that reached the store.
    pub fn submissions(&self) -> usize {
        self.script.submissions.load(Ordering::SeqCst)
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.inner
            .row_count(&TableName::new_unchecked(table))
            .await
            .unwrap_or_default()
    }
}

impl TableStore for ScriptedTableStore {
    fn table(&self, name: &TableName) -> Arc<dyn TableHandle> {
        Arc::new(ScriptedTableHandle {
            inner: self.inner.table(name),
            script: self.script.clone(),
        })
    }
}

impl ScriptedTableHandle {
    fn key(&self) -> String {
        self.inner.name().storage_key()
    }

    fn transport_error(&self) -> Option<TableStoreError> {
        lock(&self.script.failing_tables).get(&self.key()).cloned()
    }

    fn rejected_status(&self, operation: &WriteOperation) -> Option<StatusCode> {
        lock(&self.script.rejected_rows)
            .get(operation.row_key())
            .copied()
    }
}

#[async_trait]
impl TableHandle for ScriptedTableHandle {
    fn name(&self) -> &TableName {
        self.inner.name()
    }

    async fn exists(&self) -> Result<bool> {
        self.inner.exists().await
    }

    async fn ensure_exists(&self) -> Result<()> {
        if let Some(ct) = lock(&self.script.cancel_on_ensure).get(&self.key()) {
            ct.cancel();
        }

        if let Some(error) = lock(&self.script.unavailable_tables).get(&self.key()).cloned() {
            return Err(error);
        }

        lock(&self.script.ensured).insert(self.key());
        self.inner.ensure_exists().await
    }

    async fn delete_table(&self) -> Result<()> {
        self.inner.delete_table().await
    }

    async fn retrieve(&self, partition_key: &str, row_key: &str) -> Result<Option<StoredEntity>> {
        self.inner.retrieve(partition_key, row_key).await
    }

    async fn submit(&self, operation: WriteOperation, ct: CancellationToken) -> Result<ItemResult> {
        self.script.submissions.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.transport_error() {
            return Err(error);
        }

        if let Some(status) = self.rejected_status(&operation) {
            return Ok(ItemResult::new(self.name().clone(), &operation, status));
        }

        self.inner.submit(operation, ct).await
    }

    /// Rejected rows make the store report a status for every item without
    /// applying any of them.
    async fn submit_batch(&self, batch: Batch, ct: CancellationToken) -> Result<Vec<ItemResult>> {
        self.script.submissions.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.transport_error() {
            return Err(error);
        }

        if batch
            .operations
            .iter()
            .any(|op| self.rejected_status(op).is_some())
        {
            let results = batch
                .operations
                .iter()
                .map(|op| {
                    let status = self.rejected_status(op).unwrap_or(StatusCode::NO_CONTENT);
                    ItemResult::new(self.name().clone(), op, status)
                })
                .collect();
            return Ok(results);
        }

        self.inner.submit_batch(batch, ct).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().expect("script lock poisoned")
}

pub fn people() -> TableName {
    TableName::new_unchecked("people")
}

pub fn change(table: &str, kind: ChangeKind, partition_key: &str, row_key: &str) -> PendingChange {
    PendingChange::new(
        TableName::new_unchecked(table),
        kind,
        Entity::new(partition_key, row_key).with_property("row", row_key),
    )
}

pub fn added(table: &str, partition_key: &str, row_key: &str) -> PendingChange {
    change(table, ChangeKind::Added, partition_key, row_key)
}

/// `n` inserts into a single partition.
pub fn added_many(table: &str, partition_key: &str, n: usize) -> Vec<PendingChange> {
    (0..n)
        .map(|i| added(table, partition_key, &format!("row{i:04}")))
        .collect()
}

pub fn unavailable() -> TableStoreError {
    TableStoreError::Internal {
        message: "service unavailable".to_string(),
    }
}
