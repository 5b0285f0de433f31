use std::{collections::BTreeMap, sync::Arc};

use strata_core::{PendingChange, TableCache, TableStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    aggregator::{SettledSubmission, applied_count, inspect_results, settle},
    batcher::build_all_batches,
    dispatcher::{SubmissionUnit, dispatch},
    error::Result,
    grouper::{TableGroup, group_changes},
    metrics::WriterMetrics,
    options::{WriteMode, WriterOptions},
};

/// Saves pending changes to a table store.
#[derive(Clone)]
pub struct ChangeWriter {
    tables: TableCache,
    options: WriterOptions,
    metrics: Arc<WriterMetrics>,
}

impl ChangeWriter {
    pub fn new(store: Arc<dyn TableStore>, options: WriterOptions) -> Result<Self> {
        Self::with_cache(TableCache::new(store), options)
    }

    pub fn with_cache(tables: TableCache, options: WriterOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            tables,
            options,
            metrics: Default::default(),
        })
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Applies the changes and returns the number of applied operations.
    ///
    /// All submissions are awaited before returning, even when one of them
    /// failed. If any failed, the error of the first one is returned and
    /// the operations applied by the others stay applied.
    ///
    /// If `ct` is cancelled no further submissions are started. Once the
    /// started ones finish, the number of operations they applied is returned.
    pub async fn save_changes(
        &self,
        changes: &[PendingChange],
        ct: CancellationToken,
    ) -> Result<usize> {
        let groups = group_changes(changes)?;
        let units = self.plan(groups);

        let total: usize = units.iter().map(SubmissionUnit::operation_count).sum();
        debug!(
            changes = changes.len(),
            operations = total,
            submissions = units.len(),
            "saving changes"
        );

        let dispatch = dispatch(&self.tables, units, &ct).await;
        let skipped = dispatch.skipped;
        let submitted = total - skipped;

        self.metrics
            .operations_submitted
            .add(submitted as u64, &[]);
        self.metrics
            .batches_submitted
            .add(dispatch.dispatched() as u64, &[]);

        let settled = settle(dispatch.submissions).await;
        self.invalidate_missing_tables(&settled).await;

        let failed = settled.iter().filter(|s| s.is_failure()).count();
        self.metrics.batches_failed.add(failed as u64, &[]);
        self.metrics
            .operations_applied
            .add(applied_count(&settled) as u64, &[]);

        let applied = inspect_results(&settled).inspect_err(|err| {
            warn!(err = %err, failed, submissions = settled.len(), "failed to save changes");
        })?;

        if skipped > 0 {
            self.metrics.operations_skipped.add(skipped as u64, &[]);
            warn!(applied, skipped, "save cancelled before all changes were submitted");
        } else {
            info!(applied, submissions = settled.len(), "saved changes");
        }

        Ok(applied)
    }

    /// Tables dropped behind the cache's back are resolved again next time.
    async fn invalidate_missing_tables(&self, settled: &[SettledSubmission]) {
        let missing: BTreeMap<_, _> = settled
            .iter()
            .filter(|submission| submission.is_table_not_found())
            .map(|submission| (submission.table.storage_key(), &submission.table))
            .collect();

        for table in missing.into_values() {
            debug!(table = %table, "table not found, removing it from the cache");
            self.tables.invalidate(table).await;
        }
    }

    fn plan(&self, groups: Vec<TableGroup>) -> Vec<SubmissionUnit> {
        match self.options.mode {
            WriteMode::Batched => build_all_batches(groups, self.options.max_batch_operations)
                .into_iter()
                .map(SubmissionUnit::Batch)
                .collect(),
            WriteMode::Single => groups
                .into_iter()
                .flat_map(|group| {
                    let table = group.table;
                    group
                        .partitions
                        .into_iter()
                        .flat_map(|partition| partition.operations)
                        .map(move |operation| SubmissionUnit::Single {
                            table: table.clone(),
                            operation,
                        })
                })
                .collect(),
        }
    }
}
