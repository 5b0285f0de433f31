use std::time::Instant;

use chrono::Utc;
use clap::Args;
use snafu::ResultExt;
use strata_core::{Entity, PendingChange, TableName};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{InvalidResourceNameSnafu, Result, SaveChangesSnafu},
    store::StoreArgs,
};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// The table to insert into.
    #[arg(long, default_value = "loadtest")]
    table: String,
    /// The partition every row is inserted into.
    #[arg(long, default_value = "p0")]
    partition_key: String,
    /// The number of rows to insert.
    #[arg(long, default_value = "1000")]
    count: usize,
    #[clap(flatten)]
    store: StoreArgs,
}

impl GenerateArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let table = TableName::new(&self.table).context(InvalidResourceNameSnafu {
            resource: "table",
        })?;

        let changes = generate_changes(&table, &self.partition_key, self.count);

        let opened = self.store.open().await?;
        let writer = self.store.writer(&opened)?;

        let start = Instant::now();
        let applied = writer
            .save_changes(&changes, ct)
            .await
            .context(SaveChangesSnafu {})?;
        let elapsed = start.elapsed();

        info!(
            table = %table,
            applied,
            elapsed_ms = elapsed.as_millis() as u64,
            "generate finished"
        );
        println!(
            "Inserted {applied} rows into {table} in {:.2}s",
            elapsed.as_secs_f64()
        );

        Ok(())
    }
}

fn generate_changes(table: &TableName, partition_key: &str, count: usize) -> Vec<PendingChange> {
    let created_at = Utc::now();

    (0..count)
        .map(|index| {
            let entity = Entity::new(partition_key, format!("{index:010}"))
                .with_property("index", index as i64)
                .with_property("id", Uuid::new_v4())
                .with_property("created_at", created_at);
            PendingChange::added(table.clone(), entity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use strata_core::{ChangeKind, Property};

    use super::*;

    #[test]
    fn test_generate_changes() {
        let table = TableName::new_unchecked("loadtest");
        let changes = generate_changes(&table, "p0", 3);

        assert_eq!(changes.len(), 3);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
        assert!(changes.iter().all(|c| c.partition_key() == Some("p0")));
        assert_eq!(changes[2].row_key(), "0000000002");
        assert_eq!(
            changes[2].entity.properties.get("index"),
            Some(&Property::Int64(2))
        );
    }
}
