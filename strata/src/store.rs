use std::{path::PathBuf, sync::Arc};

use clap::{Args, ValueEnum};
use snafu::ResultExt;
use strata_core::TableStore;
use strata_memory::InMemoryTableStore;
use strata_object_store::{
    LocalFileSystemFactory, ObjectStoreFactory, ObjectStoreTableStore, TemporaryFileSystemFactory,
};
use strata_writer::{ChangeWriter, WriteMode, WriterOptions};

use crate::error::{InvalidArgumentSnafu, ObjectStoreSnafu, Result, SaveChangesSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Keep tables in memory, discarded on exit
    Memory,
    /// Store tables in a temporary directory, removed on exit
    Temp,
    /// Store tables in a local directory
    Local,
}

/// Arguments for configuring the table store and the writer.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Where tables are stored.
    #[arg(long, value_enum, default_value = "temp", env = "STRATA_STORE")]
    pub store: StoreKind,
    /// Root directory of the local store.
    ///
    /// Required when `--store local` is used.
    #[arg(long, env = "STRATA_STORE_PATH")]
    pub store_path: Option<PathBuf>,
    /// Storage account name, each account gets its own directory.
    #[arg(long, default_value = "dev")]
    pub account: String,
    /// Maximum number of operations per batch, between 1 and 100.
    #[arg(long, default_value = "100")]
    pub max_batch_operations: usize,
    /// Submit every operation on its own instead of batching them.
    #[arg(long)]
    pub single: bool,
}

/// A table store and whatever keeps its storage alive.
pub struct OpenedStore {
    pub store: Arc<dyn TableStore>,
    _temp_factory: Option<TemporaryFileSystemFactory>,
}

impl StoreArgs {
    pub async fn open(&self) -> Result<OpenedStore> {
        match self.store {
            StoreKind::Memory => Ok(OpenedStore {
                store: Arc::new(InMemoryTableStore::new()),
                _temp_factory: None,
            }),
            StoreKind::Temp => {
                let factory = TemporaryFileSystemFactory::new().context(ObjectStoreSnafu {})?;
                let object_store = factory
                    .create_object_store(&self.account)
                    .await
                    .context(ObjectStoreSnafu {})?;

                tracing::info!(root = %factory.root_path().display(), "using temporary store");

                Ok(OpenedStore {
                    store: Arc::new(ObjectStoreTableStore::new(object_store)),
                    _temp_factory: Some(factory),
                })
            }
            StoreKind::Local => {
                let Some(path) = &self.store_path else {
                    return InvalidArgumentSnafu {
                        name: "store-path",
                        message: "required when using the local store",
                    }
                    .fail();
                };

                let factory = LocalFileSystemFactory::new(path).context(ObjectStoreSnafu {})?;
                let object_store = factory
                    .create_object_store(&self.account)
                    .await
                    .context(ObjectStoreSnafu {})?;

                Ok(OpenedStore {
                    store: Arc::new(ObjectStoreTableStore::new(object_store)),
                    _temp_factory: None,
                })
            }
        }
    }

    pub fn writer_options(&self) -> WriterOptions {
        let mode = if self.single {
            WriteMode::Single
        } else {
            WriteMode::Batched
        };

        WriterOptions::new()
            .with_max_batch_operations(self.max_batch_operations)
            .with_mode(mode)
    }

    pub fn writer(&self, store: &OpenedStore) -> Result<ChangeWriter> {
        ChangeWriter::new(store.store.clone(), self.writer_options()).context(SaveChangesSnafu {})
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        store: StoreArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["strata"]);
        assert_eq!(cli.store.store, StoreKind::Temp);
        assert_eq!(cli.store.writer_options(), WriterOptions::default());
    }

    #[test]
    fn test_single_mode() {
        let cli = TestCli::parse_from(["strata", "--single", "--max-batch-operations", "10"]);
        let options = cli.store.writer_options();
        assert_eq!(options.mode, WriteMode::Single);
        assert_eq!(options.max_batch_operations, 10);
    }

    #[tokio::test]
    async fn test_local_store_requires_path() {
        let cli = TestCli::parse_from(["strata", "--store", "local"]);
        assert!(cli.store.open().await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_batch_size_is_rejected() {
        let cli = TestCli::parse_from(["strata", "--store", "memory", "--max-batch-operations", "500"]);
        let opened = cli.store.open().await.unwrap();
        assert!(cli.store.writer(&opened).is_err());
    }
}
