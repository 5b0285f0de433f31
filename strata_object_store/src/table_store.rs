use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::TryStreamExt;
use object_store::{ObjectStore, PutMode, PutPayload, path::Path};
use snafu::ResultExt;
use strata_core::{
    Batch, ItemResult, PartitionRows, StoredEntity, TableHandle, TableName, TableStore,
    TableStoreError, WriteOperation,
    table::{
        Result,
        error::{ObjectStoreSnafu, SerializationSnafu},
        partition::validate_batch,
    },
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::paths::{format_partition_path, format_table_marker_path, format_table_prefix};

type PartitionLockKey = (String, String);
type PartitionLocks = DashMap<PartitionLockKey, Arc<Mutex<()>>>;

/// Holds a partition lock. The lock entry is dropped with its last holder.
struct PartitionGuard {
    locks: Arc<PartitionLocks>,
    key: PartitionLockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PartitionGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Table store that keeps one JSON document per partition.
///
/// Writers to the same partition are serialized by an in-process lock. Two
/// processes writing the same partition concurrently may lose updates.
#[derive(Clone)]
pub struct ObjectStoreTableStore {
    object_store: Arc<dyn ObjectStore>,
    locks: Arc<PartitionLocks>,
}

pub struct ObjectStoreTableHandle {
    name: TableName,
    object_store: Arc<dyn ObjectStore>,
    locks: Arc<PartitionLocks>,
}

impl ObjectStoreTableStore {
    pub fn new(object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            object_store,
            locks: Default::default(),
        }
    }

    fn handle(&self, name: &TableName) -> ObjectStoreTableHandle {
        ObjectStoreTableHandle {
            name: name.clone(),
            object_store: self.object_store.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl TableStore for ObjectStoreTableStore {
    fn table(&self, name: &TableName) -> Arc<dyn TableHandle> {
        Arc::new(self.handle(name))
    }
}

impl ObjectStoreTableHandle {
    async fn lock_partition(&self, partition_key: &str) -> PartitionGuard {
        let key = (self.name.storage_key(), partition_key.to_string());
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;

        PartitionGuard {
            locks: self.locks.clone(),
            key,
            guard: Some(guard),
        }
    }

    async fn require_table(&self) -> Result<()> {
        if self.exists().await? {
            Ok(())
        } else {
            Err(TableStoreError::TableNotFound {
                table: self.name.clone(),
            })
        }
    }

    async fn load_partition(&self, path: &Path) -> Result<PartitionRows> {
        let response = match self.object_store.get(path).await {
            Ok(response) => response,
            Err(object_store::Error::NotFound { .. }) => return Ok(PartitionRows::default()),
            Err(err) => {
                return Err(err).context(ObjectStoreSnafu {
                    message: format!("failed to read partition {path}"),
                });
            }
        };

        let bytes = response.bytes().await.context(ObjectStoreSnafu {
            message: format!("failed to read partition {path}"),
        })?;

        serde_json::from_slice(&bytes).context(SerializationSnafu {
            message: format!("failed to decode partition {path}"),
        })
    }

    async fn save_partition(&self, path: &Path, rows: &PartitionRows) -> Result<()> {
        if rows.is_empty() {
            return match self.object_store.delete(path).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
                Err(err) => Err(err).context(ObjectStoreSnafu {
                    message: format!("failed to delete partition {path}"),
                }),
            };
        }

        let data = serde_json::to_vec(rows).context(SerializationSnafu {
            message: format!("failed to encode partition {path}"),
        })?;

        self.object_store
            .put(path, PutPayload::from(data))
            .await
            .context(ObjectStoreSnafu {
                message: format!("failed to write partition {path}"),
            })?;

        Ok(())
    }
}

#[async_trait]
impl TableHandle for ObjectStoreTableHandle {
    fn name(&self) -> &TableName {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        let marker = format_table_marker_path(&self.name);
        match self.object_store.head(&marker).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(err).context(ObjectStoreSnafu {
                message: format!("failed to check table {}", self.name),
            }),
        }
    }

    async fn ensure_exists(&self) -> Result<()> {
        let marker = format_table_marker_path(&self.name);
        let created = self
            .object_store
            .put_opts(&marker, PutPayload::new(), PutMode::Create.into())
            .await;

        match created {
            Ok(_) => {
                debug!(table = %self.name, "created table");
                Ok(())
            }
            Err(object_store::Error::AlreadyExists { .. }) => Ok(()),
            Err(err) => Err(err).context(ObjectStoreSnafu {
                message: format!("failed to create table {}", self.name),
            }),
        }
    }

    async fn delete_table(&self) -> Result<()> {
        self.require_table().await?;

        let prefix = format_table_prefix(&self.name);
        let objects: Vec<_> = self
            .object_store
            .list(Some(&prefix))
            .try_collect()
            .await
            .context(ObjectStoreSnafu {
                message: format!("failed to list table {}", self.name),
            })?;

        let marker = format_table_marker_path(&self.name);
        for object in objects.iter().filter(|object| object.location != marker) {
            self.object_store
                .delete(&object.location)
                .await
                .context(ObjectStoreSnafu {
                    message: format!("failed to delete {}", object.location),
                })?;
        }

        // The marker goes last so a failed delete can be retried.
        self.object_store
            .delete(&marker)
            .await
            .context(ObjectStoreSnafu {
                message: format!("failed to delete table {}", self.name),
            })?;

        debug!(table = %self.name, objects = objects.len(), "deleted table");

        Ok(())
    }

    async fn retrieve(&self, partition_key: &str, row_key: &str) -> Result<Option<StoredEntity>> {
        self.require_table().await?;

        let path = format_partition_path(&self.name, partition_key);
        let rows = self.load_partition(&path).await?;
        Ok(rows.get(row_key).cloned())
    }

    async fn submit(&self, operation: WriteOperation, ct: CancellationToken) -> Result<ItemResult> {
        if ct.is_cancelled() {
            return Err(TableStoreError::Cancelled);
        }

        self.require_table().await?;

        let partition_key = operation.partition_key();
        let path = format_partition_path(&self.name, partition_key);
        let _guard = self.lock_partition(partition_key).await;

        let mut rows = self.load_partition(&path).await?;
        let result = rows.apply(&self.name, &operation);

        if !result.is_failure() {
            self.save_partition(&path, &rows).await?;
        }

        Ok(result)
    }

    async fn submit_batch(&self, batch: Batch, ct: CancellationToken) -> Result<Vec<ItemResult>> {
        validate_batch(&self.name, &batch)?;

        if ct.is_cancelled() {
            return Err(TableStoreError::Cancelled);
        }

        self.require_table().await?;

        let path = format_partition_path(&self.name, &batch.partition_key);
        let _guard = self.lock_partition(&batch.partition_key).await;

        let mut rows = self.load_partition(&path).await?;
        let results = rows.apply_batch(&self.name, &batch.operations);

        if !results.iter().any(ItemResult::is_failure) {
            self.save_partition(&path, &rows).await?;
        }

        debug!(
            table = %self.name,
            partition_key = %batch.partition_key,
            operations = batch.operations.len(),
            "applied batch"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;
    use strata_core::{ETag, Entity};

    use super::*;
    use crate::{ObjectStoreFactory, TemporaryFileSystemFactory};

    fn people() -> TableName {
        TableName::new_unchecked("people")
    }

    fn insert(partition_key: &str, row_key: &str) -> WriteOperation {
        WriteOperation::Insert {
            entity: Entity::new(partition_key, row_key).with_property("name", row_key),
        }
    }

    #[tokio::test]
    async fn test_ensure_exists_creates_marker_once() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());

        assert!(!handle.exists().await.unwrap());
        handle.ensure_exists().await.unwrap();
        handle.ensure_exists().await.unwrap();
        assert!(handle.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_to_missing_table() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());

        let err = handle
            .submit(insert("p", "a"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_table_not_found());
    }

    #[tokio::test]
    async fn test_rows_round_trip_through_local_files() {
        let factory = TemporaryFileSystemFactory::new().unwrap();
        let object_store = factory.create_object_store("dev").await.unwrap();

        let store = ObjectStoreTableStore::new(object_store.clone());
        let handle = store.table(&people());
        handle.ensure_exists().await.unwrap();

        let batch = Batch::new(people(), "emea")
            .with_operations(vec![insert("emea", "a"), insert("emea", "b")]);
        let results = handle
            .submit_batch(batch, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        // A fresh store over the same files sees the rows.
        let reopened = ObjectStoreTableStore::new(object_store).table(&people());
        let row = reopened.retrieve("emea", "a").await.unwrap().unwrap();
        assert_eq!(Some(row.etag.clone()), results[0].etag);
        assert_eq!(row.properties.get("name"), Some(&"a".into()));

        let deleted = reopened
            .submit(
                WriteOperation::Delete {
                    entity: Entity::new("emea", "b"),
                    etag: ETag::Value(results[1].etag.clone().unwrap()),
                },
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status, 204);
        assert!(handle.retrieve("emea", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_batch_is_not_persisted() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());
        handle.ensure_exists().await.unwrap();

        handle
            .submit(insert("p", "b"), CancellationToken::new())
            .await
            .unwrap();

        let batch = Batch::new(people(), "p").with_operations(vec![insert("p", "a"), insert("p", "b")]);
        let results = handle
            .submit_batch(batch, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, 409);
        assert!(handle.retrieve("p", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers_to_one_partition() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());
        handle.ensure_exists().await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let handle = store.table(&people());
                tokio::spawn(async move {
                    handle
                        .submit(insert("p", &format!("r{i}")), CancellationToken::new())
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().status, 204);
        }

        for i in 0..20 {
            let row_key = format!("r{i}");
            assert!(handle.retrieve("p", &row_key).await.unwrap().is_some());
        }

        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn test_partition_locks_are_released() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());
        handle.ensure_exists().await.unwrap();

        for i in 0..50 {
            let partition_key = format!("p{i}");
            handle
                .submit(insert(&partition_key, "a"), CancellationToken::new())
                .await
                .unwrap();

            // Failed writes release the lock too.
            let results = handle
                .submit_batch(
                    Batch::new(people(), partition_key.clone())
                        .with_operations(vec![insert(&partition_key, "a")]),
                    CancellationToken::new(),
                )
                .await
                .unwrap();
            assert_eq!(results[0].status, 409);
        }

        assert!(store.locks.is_empty());

        let held = store.handle(&people()).lock_partition("p0").await;
        assert_eq!(store.locks.len(), 1);
        drop(held);
        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn test_delete_table() {
        let store = ObjectStoreTableStore::new(Arc::new(InMemory::new()));
        let handle = store.table(&people());
        handle.ensure_exists().await.unwrap();
        handle
            .submit(insert("p", "a"), CancellationToken::new())
            .await
            .unwrap();

        handle.delete_table().await.unwrap();
        assert!(!handle.exists().await.unwrap());
        assert!(handle.delete_table().await.unwrap_err().is_table_not_found());

        // Recreating the table starts empty.
        handle.ensure_exists().await.unwrap();
        assert!(handle.retrieve("p", "a").await.unwrap().is_none());
    }
}
