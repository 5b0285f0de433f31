use strata_observability::Counter;

#[derive(Debug)]
pub struct WriterMetrics {
    pub operations_submitted: Counter<u64>,
    pub operations_applied: Counter<u64>,
    pub operations_skipped: Counter<u64>,
    pub batches_submitted: Counter<u64>,
    pub batches_failed: Counter<u64>,
}

impl Default for WriterMetrics {
    fn default() -> Self {
        let meter = strata_observability::meter("writer");

        Self {
            operations_submitted: meter
                .u64_counter("writer.operations.submitted")
                .with_description("the number of operations submitted to the store")
                .build(),
            operations_applied: meter
                .u64_counter("writer.operations.applied")
                .with_description("the number of operations the store applied")
                .build(),
            operations_skipped: meter
                .u64_counter("writer.operations.skipped")
                .with_description("the number of operations not submitted because of cancellation")
                .build(),
            batches_submitted: meter
                .u64_counter("writer.batches.submitted")
                .with_description("the number of submissions, batches or single operations")
                .build(),
            batches_failed: meter
                .u64_counter("writer.batches.failed")
                .with_description("the number of submissions that failed")
                .build(),
        }
    }
}
