use crate::resources::{ETag, Entity, TableName};

/// The maximum number of operations the remote store accepts in one batch.
pub const MAX_BATCH_OPERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Replace,
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A primitive write against a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Create the row, failing if it already exists.
    Insert { entity: Entity },
    /// Overwrite the row if its version matches `etag`.
    Replace { entity: Entity, etag: ETag },
    /// Remove the row if its version matches `etag`.
    Delete { entity: Entity, etag: ETag },
}

impl WriteOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Insert { .. } => OperationKind::Insert,
            Self::Replace { .. } => OperationKind::Replace,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn entity(&self) -> &Entity {
        match self {
            Self::Insert { entity }
            | Self::Replace { entity, .. }
            | Self::Delete { entity, .. } => entity,
        }
    }

    /// The partition key, or the empty string if the entity has none.
    pub fn partition_key(&self) -> &str {
        self.entity().partition_key.as_deref().unwrap_or_default()
    }

    pub fn row_key(&self) -> &str {
        &self.entity().row_key
    }
}

/// Operations on a single partition of a table, applied atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub table: TableName,
    pub partition_key: String,
    pub operations: Vec<WriteOperation>,
}

impl Batch {
    pub fn new(table: TableName, partition_key: impl Into<String>) -> Self {
        Self {
            table,
            partition_key: partition_key.into(),
            operations: Vec::new(),
        }
    }

    pub fn with_operations(mut self, operations: Vec<WriteOperation>) -> Self {
        self.operations = operations;
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
