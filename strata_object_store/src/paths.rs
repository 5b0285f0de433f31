use object_store::path::Path;
use strata_core::TableName;

const TABLE_MARKER: &str = ".table";
const PARTITIONS_DIR: &str = "partitions";
/// Partition key bytes per path segment, hex encoded into 200 characters.
const SEGMENT_KEY_BYTES: usize = 100;

/// Prefix of every object belonging to the table.
pub fn format_table_prefix(table: &TableName) -> Path {
    Path::from(table.storage_key())
}

/// Object whose presence records that the table exists.
pub fn format_table_marker_path(table: &TableName) -> Path {
    Path::from(format!("{}/{TABLE_MARKER}", table.storage_key()))
}

/// Document holding all rows of a partition.
///
/// Partition keys are arbitrary strings, they are hex encoded so that every
/// key maps to a valid and distinct object name. Keys longer than 100 bytes
/// are split into several segments to stay below file name limits.
pub fn format_partition_path(table: &TableName, partition_key: &str) -> Path {
    Path::from(format!(
        "{}/{PARTITIONS_DIR}/{}.json",
        table.storage_key(),
        encode_partition_key(partition_key)
    ))
}

fn encode_partition_key(partition_key: &str) -> String {
    partition_key
        .as_bytes()
        .chunks(SEGMENT_KEY_BYTES)
        .map(|chunk| chunk.iter().map(|b| format!("{b:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join("/")
}
