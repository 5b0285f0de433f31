use snafu::Snafu;
use strata_core::{ChangeKindParseError, ItemResult, TableName, TableStoreError};
use strata_observability::ErrorKind;

/// Errors returned when saving changes.
///
/// When a save fails, some of its batches may already have been applied.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum SaveChangesError {
    /// The change tracker reported a state this writer doesn't understand.
    #[snafu(display("unhandled change kind: {kind}"))]
    UnhandledChangeKind { kind: String },
    #[snafu(display("row {row_key} of table {table} has no partition key"))]
    MissingPartitionKey { table: TableName, row_key: String },
    /// A submission failed before the store reported per-row results.
    #[snafu(display("failed to submit changes to table {table}"))]
    Transport {
        table: TableName,
        source: TableStoreError,
    },
    /// The store rejected a row.
    #[snafu(display("failed to persist changes: {item}"))]
    Persistence { item: ItemResult },
    #[snafu(display("invalid writer options: {message}"))]
    InvalidOptions { message: String },
    #[snafu(display("unsupported operation: {operation}"))]
    Unsupported { operation: &'static str },
}

pub type Result<T, E = SaveChangesError> = std::result::Result<T, E>;

impl From<ChangeKindParseError> for SaveChangesError {
    fn from(error: ChangeKindParseError) -> Self {
        Self::UnhandledChangeKind { kind: error.kind }
    }
}

impl SaveChangesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnhandledChangeKind { .. } | Self::MissingPartitionKey { .. } => {
                ErrorKind::Validation
            }
            Self::Transport { source, .. } => source.kind(),
            Self::Persistence { item } => match item.status {
                404 => ErrorKind::NotFound,
                409 | 412 => ErrorKind::Conflict,
                400..=499 => ErrorKind::Validation,
                _ => ErrorKind::Temporary,
            },
            Self::InvalidOptions { .. } => ErrorKind::Configuration,
            Self::Unsupported { .. } => ErrorKind::Validation,
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The rejected row, if the store rejected one.
    pub fn item(&self) -> Option<&ItemResult> {
        match self {
            Self::Persistence { item } => Some(item),
            _ => None,
        }
    }
}
