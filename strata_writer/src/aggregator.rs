use futures::future::join_all;
use strata_core::{TableName, TableStoreError};

use crate::{
    dispatcher::{PendingSubmission, SubmissionOutcome},
    error::{Result, SaveChangesError},
};

/// A submission after it finished.
#[derive(Debug, Clone)]
pub struct SettledSubmission {
    pub table: TableName,
    pub operations: usize,
    pub outcome: SubmissionOutcome,
}

impl SettledSubmission {
    pub fn is_failure(&self) -> bool {
        match &self.outcome {
            Ok(results) => results.iter().any(|r| r.is_failure()),
            Err(_) => true,
        }
    }

    pub fn is_table_not_found(&self) -> bool {
        matches!(&self.outcome, Err(err) if err.is_table_not_found())
    }
}

/// Waits for every submission, keeping dispatch order.
pub async fn settle(submissions: Vec<PendingSubmission>) -> Vec<SettledSubmission> {
    let settled = submissions.into_iter().map(|submission| async move {
        match submission {
            PendingSubmission::Settled {
                table,
                operations,
                outcome,
            } => SettledSubmission {
                table,
                operations,
                outcome,
            },
            PendingSubmission::Running {
                table,
                operations,
                task,
            } => {
                let outcome = task.await.unwrap_or_else(|err| {
                    Err(TableStoreError::Internal {
                        message: format!("submission task failed: {err}"),
                    })
                });

                SettledSubmission {
                    table,
                    operations,
                    outcome,
                }
            }
        }
    });

    join_all(settled).await
}

/// Reduces settled submissions to the number of applied operations.
///
/// Transport errors take precedence over rejected rows. Within each group,
/// the first one in dispatch order is returned.
pub fn inspect_results(settled: &[SettledSubmission]) -> Result<usize> {
    if let Some((table, source)) = settled.iter().find_map(|s| match &s.outcome {
        Err(err) => Some((&s.table, err)),
        Ok(_) => None,
    }) {
        return Err(SaveChangesError::Transport {
            table: table.clone(),
            source: source.clone(),
        });
    }

    let mut count = 0;
    for submission in settled {
        let Ok(results) = &submission.outcome else {
            continue;
        };

        if let Some(item) = results.iter().find(|r| r.is_failure()) {
            return Err(SaveChangesError::Persistence { item: item.clone() });
        }

        count += results.len();
    }

    Ok(count)
}

/// Number of operations applied by the submissions that succeeded.
pub fn applied_count(settled: &[SettledSubmission]) -> usize {
    settled
        .iter()
        .filter(|s| !s.is_failure())
        .map(|s| s.outcome.as_ref().map_or(0, Vec::len))
        .sum()
}
