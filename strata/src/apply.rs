use std::{collections::BTreeMap, path::PathBuf};

use clap::Args;
use snafu::ResultExt;
use strata_writer::create_tables;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    error::{IoSnafu, Result, SaveChangesSnafu},
    record::parse_changes,
    store::StoreArgs,
};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// JSON lines file with one pending change per line, `-` reads stdin.
    input: PathBuf,
    #[clap(flatten)]
    store: StoreArgs,
}

impl ApplyArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let input = self.read_input().await?;
        let changes = parse_changes(&input)?;

        let opened = self.store.open().await?;
        let writer = self.store.writer(&opened)?;

        let tables: BTreeMap<_, _> = changes
            .iter()
            .map(|change| (change.table.storage_key(), change.table.clone()))
            .collect();
        let tables: Vec<_> = tables.into_values().collect();

        create_tables(opened.store.clone(), &tables, &ct)
            .await
            .context(SaveChangesSnafu {})?;

        let applied = writer
            .save_changes(&changes, ct)
            .await
            .context(SaveChangesSnafu {})?;

        info!(changes = changes.len(), applied, "apply finished");
        println!("Applied {applied} operations from {} changes", changes.len());

        Ok(())
    }

    async fn read_input(&self) -> Result<String> {
        let path = self.input.display().to_string();
        let mut input = String::new();

        if path == "-" {
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context(IoSnafu { path })?;
        } else {
            input = tokio::fs::read_to_string(&self.input)
                .await
                .context(IoSnafu { path })?;
        }

        Ok(input)
    }
}
