use std::collections::HashMap;

use strata_core::{PendingChange, TableName, WriteOperation};

use crate::{
    error::{MissingPartitionKeySnafu, Result},
    mapper::map_change,
};

/// Operations targeting a single partition, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionGroup {
    pub partition_key: String,
    pub operations: Vec<WriteOperation>,
}

/// Partition groups of a single table, in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroup {
    pub table: TableName,
    pub partitions: Vec<PartitionGroup>,
}

impl TableGroup {
    pub fn operation_count(&self) -> usize {
        self.partitions.iter().map(|p| p.operations.len()).sum()
    }
}

/// Groups changes by table, then by partition key.
///
/// Changes that need no write are dropped. Every change must have a
/// partition key, including the dropped ones. Table names are matched the
/// way the store matches them, partition keys are matched exactly.
pub fn group_changes(changes: &[PendingChange]) -> Result<Vec<TableGroup>> {
    let mut groups: Vec<TableGroup> = Vec::new();
    let mut table_index: HashMap<String, usize> = HashMap::new();
    let mut partition_index: HashMap<(usize, String), usize> = HashMap::new();

    for change in changes {
        let Some(partition_key) = change.partition_key() else {
            return MissingPartitionKeySnafu {
                table: change.table.clone(),
                row_key: change.row_key(),
            }
            .fail();
        };

        let Some(operation) = map_change(change) else {
            continue;
        };

        let table_idx = *table_index
            .entry(change.table.storage_key())
            .or_insert_with(|| {
                groups.push(TableGroup {
                    table: change.table.clone(),
                    partitions: Vec::new(),
                });
                groups.len() - 1
            });

        let partitions = &mut groups[table_idx].partitions;
        let partition_idx = *partition_index
            .entry((table_idx, partition_key.to_string()))
            .or_insert_with(|| {
                partitions.push(PartitionGroup {
                    partition_key: partition_key.to_string(),
                    operations: Vec::new(),
                });
                partitions.len() - 1
            });

        partitions[partition_idx].operations.push(operation);
    }

    Ok(groups)
}
