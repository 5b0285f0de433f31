use std::sync::Arc;

use futures::future::join_all;
use strata_core::{TableName, TableStore, TableStoreError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, SaveChangesError, UnsupportedSnafu};

/// Makes sure every table exists, creating the missing ones concurrently.
///
/// Once `ct` is cancelled no further tables are created. Returns the number
/// of tables that were checked or created.
pub async fn create_tables(
    store: Arc<dyn TableStore>,
    names: &[TableName],
    ct: &CancellationToken,
) -> Result<usize> {
    let mut tasks = Vec::with_capacity(names.len());

    for name in names {
        if ct.is_cancelled() {
            debug!(remaining = names.len() - tasks.len(), "cancelled, not creating remaining tables");
            break;
        }

        let handle = store.table(name);
        tasks.push((name.clone(), tokio::spawn(async move { handle.ensure_exists().await })));
    }

    let created = tasks.len();
    let results = join_all(tasks.into_iter().map(|(name, task)| async move {
        let result = task.await.unwrap_or_else(|err| {
            Err(TableStoreError::Internal {
                message: format!("create table task failed: {err}"),
            })
        });
        (name, result)
    }))
    .await;

    for (table, result) in results {
        if let Err(source) = result {
            return Err(SaveChangesError::Transport { table, source });
        }
    }

    info!(tables = created, "tables ready");

    Ok(created)
}

/// Deleting the storage account is never allowed.
pub fn delete_account() -> Result<()> {
    UnsupportedSnafu {
        operation: "delete storage account",
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use strata_memory::InMemoryTableStore;

    use super::*;

    #[tokio::test]
    async fn test_create_tables() {
        let store = InMemoryTableStore::new();
        let names = vec![
            TableName::new_unchecked("people"),
            TableName::new_unchecked("orders"),
        ];

        let created = create_tables(Arc::new(store.clone()), &names, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(created, 2);
        assert_eq!(store.table_names().await, vec!["orders", "people"]);

        // Existing tables are left alone.
        let created = create_tables(Arc::new(store.clone()), &names, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(created, 2);
    }

    #[tokio::test]
    async fn test_create_tables_cancelled() {
        let store = InMemoryTableStore::new();
        let ct = CancellationToken::new();
        ct.cancel();

        let created = create_tables(
            Arc::new(store.clone()),
            &[TableName::new_unchecked("people")],
            &ct,
        )
        .await
        .unwrap();
        assert_eq!(created, 0);
        assert!(store.table_names().await.is_empty());
    }

    #[test]
    fn test_delete_account_is_unsupported() {
        let err = delete_account().unwrap_err();
        assert!(matches!(err, SaveChangesError::Unsupported { .. }));
    }
}
