use strata_core::{Batch, TableName};

use crate::grouper::{PartitionGroup, TableGroup};

/// Splits a partition group into batches of at most `max_operations`.
///
/// Batches are filled in arrival order, only the last one may be partial.
pub fn build_batches(table: &TableName, group: PartitionGroup, max_operations: usize) -> Vec<Batch> {
    let PartitionGroup {
        partition_key,
        operations,
    } = group;

    let mut batches = Vec::with_capacity(operations.len().div_ceil(max_operations.max(1)));
    let mut current = Vec::with_capacity(max_operations.min(operations.len()));

    for operation in operations {
        current.push(operation);

        if current.len() >= max_operations {
            let sealed = std::mem::take(&mut current);
            batches.push(Batch::new(table.clone(), partition_key.clone()).with_operations(sealed));
        }
    }

    if !current.is_empty() {
        batches.push(Batch::new(table.clone(), partition_key).with_operations(current));
    }

    batches
}

/// Builds the batches of every group, in dispatch order.
pub fn build_all_batches(groups: Vec<TableGroup>, max_operations: usize) -> Vec<Batch> {
    groups
        .into_iter()
        .flat_map(|group| {
            let table = group.table;
            group
                .partitions
                .into_iter()
                .flat_map(move |partition| build_batches(&table, partition, max_operations))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use strata_core::{Entity, MAX_BATCH_OPERATIONS, WriteOperation};

    use super::*;

    fn table() -> TableName {
        TableName::new_unchecked("people")
    }

    fn group(n: usize) -> PartitionGroup {
        PartitionGroup {
            partition_key: "p".to_string(),
            operations: (0..n)
                .map(|i| WriteOperation::Insert {
                    entity: Entity::new("p", format!("r{i}")),
                })
                .collect(),
        }
    }

    #[test]
    fn test_batch_sizes() {
        for (n, expected) in [
            (1, vec![1]),
            (99, vec![99]),
            (100, vec![100]),
            (101, vec![100, 1]),
            (250, vec![100, 100, 50]),
        ] {
            let sizes: Vec<_> = build_batches(&table(), group(n), MAX_BATCH_OPERATIONS)
                .iter()
                .map(Batch::len)
                .collect();
            assert_eq!(sizes, expected, "n = {n}");
        }
    }

    #[test]
    fn test_empty_group_yields_no_batches() {
        assert!(build_batches(&table(), group(0), MAX_BATCH_OPERATIONS).is_empty());
    }

    #[test]
    fn test_batches_preserve_order() {
        let input = group(250);
        let expected: Vec<_> = input.operations.clone();

        let batches = build_batches(&table(), input, MAX_BATCH_OPERATIONS);
        assert!(batches.iter().all(|b| b.partition_key == "p" && b.table == table()));

        let concatenated: Vec<_> = batches.into_iter().flat_map(|b| b.operations).collect();
        assert_eq!(concatenated, expected);
    }

    #[test]
    fn test_smaller_capacity() {
        let sizes: Vec<_> = build_batches(&table(), group(7), 3)
            .iter()
            .map(Batch::len)
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_build_all_batches_keeps_group_order() {
        let groups = vec![
            TableGroup {
                table: TableName::new_unchecked("people"),
                partitions: vec![group(3), group(1)],
            },
            TableGroup {
                table: TableName::new_unchecked("orders"),
                partitions: vec![group(2)],
            },
        ];

        let batches = build_all_batches(groups, 2);
        let shape: Vec<_> = batches
            .iter()
            .map(|b| (b.table.as_str().to_string(), b.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("people".to_string(), 2),
                ("people".to_string(), 1),
                ("people".to_string(), 1),
                ("orders".to_string(), 2),
            ]
        );
    }
}
