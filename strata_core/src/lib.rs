pub mod resources;
pub mod table;

pub use self::resources::{
    ChangeKind, ChangeKindParseError, ETag, Entity, PendingChange, Properties, Property,
    ResourceError, ResourceResult, TableEntity, TableName, validate_table_name,
};
pub use self::table::{
    Batch, CacheOptions, ItemResult, MAX_BATCH_OPERATIONS, OperationKind, PartitionRows,
    StoredEntity, TableCache, TableHandle, TableStore, TableStoreError, WriteOperation,
};
