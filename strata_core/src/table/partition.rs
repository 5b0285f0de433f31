//! Row semantics shared by the table store backends.
//!
//! A partition is a set of rows keyed by row key. Single operations are
//! applied one at a time, batches are applied all or nothing.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::resources::{ETag, Properties, TableName};

use super::{
    Batch, ItemResult, MAX_BATCH_OPERATIONS, WriteOperation,
    error::{Result, TableStoreError},
};

/// Returns a fresh weak entity tag.
pub fn new_etag() -> String {
    format!("W/\"{}\"", Ulid::new())
}

/// A row as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub etag: String,
    pub timestamp: DateTime<Utc>,
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionRows {
    pub rows: BTreeMap<String, StoredEntity>,
}

impl PartitionRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row_key: &str) -> Option<&StoredEntity> {
        self.rows.get(row_key)
    }

    /// Applies a single operation and reports its status.
    pub fn apply(&mut self, table: &TableName, operation: &WriteOperation) -> ItemResult {
        let row_key = operation.row_key();
        let result = |status| ItemResult::new(table.clone(), operation, status);

        match operation {
            WriteOperation::Insert { entity } => {
                if self.rows.contains_key(row_key) {
                    return result(StatusCode::CONFLICT).with_message("row already exists");
                }

                let etag = new_etag();
                self.rows.insert(
                    row_key.to_string(),
                    StoredEntity {
                        etag: etag.clone(),
                        timestamp: Utc::now(),
                        properties: entity.properties.clone(),
                    },
                );

                result(StatusCode::NO_CONTENT).with_etag(etag)
            }
            WriteOperation::Replace { entity, etag } => {
                let Some(current) = self.rows.get_mut(row_key) else {
                    return result(StatusCode::NOT_FOUND).with_message("row not found");
                };

                if !etag.matches(&current.etag) {
                    return precondition_failed(result(StatusCode::PRECONDITION_FAILED), etag);
                }

                let new_etag = new_etag();
                current.etag = new_etag.clone();
                current.timestamp = Utc::now();
                current.properties = entity.properties.clone();

                result(StatusCode::NO_CONTENT).with_etag(new_etag)
            }
            WriteOperation::Delete { etag, .. } => {
                let Some(current) = self.rows.get(row_key) else {
                    return result(StatusCode::NOT_FOUND).with_message("row not found");
                };

                if !etag.matches(&current.etag) {
                    return precondition_failed(result(StatusCode::PRECONDITION_FAILED), etag);
                }

                self.rows.remove(row_key);
                result(StatusCode::NO_CONTENT)
            }
        }
    }

    /// Applies a batch atomically.
    ///
    /// On success one result per operation is returned, in order. If any
    /// operation fails the partition is left untouched and only the failing
    /// operation's result is returned.
    pub fn apply_batch(&mut self, table: &TableName, operations: &[WriteOperation]) -> Vec<ItemResult> {
        let mut seen = HashSet::with_capacity(operations.len());
        for operation in operations {
            if !seen.insert(operation.row_key()) {
                return vec![
                    ItemResult::new(table.clone(), operation, StatusCode::BAD_REQUEST)
                        .with_message("batch contains more than one operation on the same row"),
                ];
            }
        }

        let mut undo = Vec::with_capacity(operations.len());
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let row_key = operation.row_key();
            let previous = self.rows.get(row_key).cloned();

            // A failed operation leaves its row untouched.
            let result = self.apply(table, operation);
            if result.is_failure() {
                self.restore(undo);
                return vec![result];
            }

            undo.push((row_key.to_string(), previous));
            results.push(result);
        }

        results
    }

    fn restore(&mut self, undo: Vec<(String, Option<StoredEntity>)>) {
        for (row_key, previous) in undo.into_iter().rev() {
            match previous {
                Some(row) => {
                    self.rows.insert(row_key, row);
                }
                None => {
                    self.rows.remove(&row_key);
                }
            }
        }
    }
}

fn precondition_failed(result: ItemResult, etag: &ETag) -> ItemResult {
    result.with_message(format!("etag {etag} does not match the stored version"))
}

/// Checks the structural rules every batch must satisfy before submission.
pub fn validate_batch(table: &TableName, batch: &Batch) -> Result<()> {
    let invalid = |message: String| TableStoreError::InvalidBatch {
        table: table.clone(),
        message,
    };

    if batch.is_empty() {
        return Err(invalid("batch is empty".to_string()));
    }

    if batch.len() > MAX_BATCH_OPERATIONS {
        return Err(invalid(format!(
            "batch has {} operations, the maximum is {MAX_BATCH_OPERATIONS}",
            batch.len()
        )));
    }

    if batch.table.storage_key() != table.storage_key() {
        return Err(invalid(format!("batch targets table {}", batch.table)));
    }

    if let Some(operation) = batch
        .operations
        .iter()
        .find(|operation| operation.partition_key() != batch.partition_key)
    {
        return Err(invalid(format!(
            "row {} belongs to partition '{}', not '{}'",
            operation.row_key(),
            operation.partition_key(),
            batch.partition_key
        )));
    }

    Ok(())
}
