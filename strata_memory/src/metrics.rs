use strata_observability::UpDownCounter;

#[derive(Debug)]
pub struct TableStoreMetrics {
    pub tables_count: UpDownCounter<i64>,
    pub rows_count: UpDownCounter<i64>,
}

impl Default for TableStoreMetrics {
    fn default() -> Self {
        let meter = strata_observability::meter("memory_table_store");

        Self {
            tables_count: meter
                .i64_up_down_counter("table_store.tables.count")
                .with_description("the number of tables")
                .build(),
            rows_count: meter
                .i64_up_down_counter("table_store.rows.count")
                .with_description("the number of rows across all tables")
                .build(),
        }
    }
}
