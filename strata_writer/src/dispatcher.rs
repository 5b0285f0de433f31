use std::{collections::HashMap, sync::Arc};

use strata_core::{
    Batch, ItemResult, TableCache, TableHandle, TableName, TableStoreError, WriteOperation,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One independent unit of work sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionUnit {
    Batch(Batch),
    Single {
        table: TableName,
        operation: WriteOperation,
    },
}

impl SubmissionUnit {
    pub fn table(&self) -> &TableName {
        match self {
            Self::Batch(batch) => &batch.table,
            Self::Single { table, .. } => table,
        }
    }

    pub fn operation_count(&self) -> usize {
        match self {
            Self::Batch(batch) => batch.len(),
            Self::Single { .. } => 1,
        }
    }
}

pub type SubmissionOutcome = Result<Vec<ItemResult>, TableStoreError>;

/// A submission that was started, or that failed before it could start.
pub enum PendingSubmission {
    Running {
        table: TableName,
        operations: usize,
        task: JoinHandle<SubmissionOutcome>,
    },
    Settled {
        table: TableName,
        operations: usize,
        outcome: SubmissionOutcome,
    },
}

pub struct Dispatch {
    /// Submissions in dispatch order.
    pub submissions: Vec<PendingSubmission>,
    /// Operations that were not submitted because of cancellation.
    pub skipped: usize,
}

impl Dispatch {
    pub fn dispatched(&self) -> usize {
        self.submissions.len()
    }
}

/// Starts every unit as its own task.
///
/// The cancellation token is checked before each unit, once it's cancelled
/// the remaining units are skipped. Started tasks always run to completion,
/// they don't observe `ct`.
///
/// If a table can't be resolved, a failed submission is recorded for it and
/// its units are not started. Other tables are not affected.
pub async fn dispatch(
    tables: &TableCache,
    units: Vec<SubmissionUnit>,
    ct: &CancellationToken,
) -> Dispatch {
    let mut submissions = Vec::with_capacity(units.len());
    let mut handles: HashMap<String, Option<Arc<dyn TableHandle>>> = HashMap::new();
    let mut units = units.into_iter();
    // Started submissions are never interrupted.
    let submission_ct = CancellationToken::new();

    while let Some(unit) = units.next() {
        if ct.is_cancelled() {
            let skipped = unit.operation_count() + units.map(|u| u.operation_count()).sum::<usize>();
            debug!(skipped, "cancelled, not submitting remaining operations");
            return Dispatch {
                submissions,
                skipped,
            };
        }

        let table = unit.table().clone();
        let operations = unit.operation_count();

        let handle = match handles.get(&table.storage_key()) {
            Some(handle) => handle.clone(),
            None => {
                let resolved = match tables.get(&table).await {
                    Ok(handle) => Some(handle),
                    Err(err) => {
                        warn!(table = %table, err = ?err, "failed to resolve table");
                        submissions.push(PendingSubmission::Settled {
                            table: table.clone(),
                            operations,
                            outcome: Err(err),
                        });
                        None
                    }
                };
                handles.insert(table.storage_key(), resolved.clone());
                resolved
            }
        };

        // Resolution failed, its error is already recorded.
        let Some(handle) = handle else {
            continue;
        };

        debug!(table = %table, operations, "submitting");

        let ct = submission_ct.clone();
        let task = tokio::spawn(async move {
            match unit {
                SubmissionUnit::Batch(batch) => handle.submit_batch(batch, ct).await,
                SubmissionUnit::Single { operation, .. } => {
                    handle.submit(operation, ct).await.map(|result| vec![result])
                }
            }
        });

        submissions.push(PendingSubmission::Running {
            table,
            operations,
            task,
        });
    }

    Dispatch {
        submissions,
        skipped: 0,
    }
}
