use std::sync::Arc;

use snafu::Snafu;
use strata_observability::ErrorKind;

use crate::resources::TableName;

/// Transport-level failures of the table store.
///
/// Per-row failures are not errors, they are reported through
/// [`ItemResult`](super::ItemResult) status codes.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum TableStoreError {
    #[snafu(display("table not found: {table}"))]
    TableNotFound { table: TableName },
    #[snafu(display("invalid batch for table {table}: {message}"))]
    InvalidBatch { table: TableName, message: String },
    #[snafu(display("object store error: {message}"))]
    ObjectStore {
        message: String,
        #[snafu(source(from(object_store::Error, Arc::new)))]
        source: Arc<object_store::Error>,
    },
    #[snafu(display("serialization error: {message}"))]
    Serialization {
        message: String,
        #[snafu(source(from(serde_json::Error, Arc::new)))]
        source: Arc<serde_json::Error>,
    },
    #[snafu(display("operation cancelled"))]
    Cancelled,
    #[snafu(display("internal error: {message}"))]
    Internal { message: String },
}

pub type Result<T, E = TableStoreError> = ::std::result::Result<T, E>;

impl TableStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TableNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidBatch { .. } => ErrorKind::Validation,
            Self::ObjectStore { .. } => ErrorKind::Temporary,
            Self::Serialization { .. } => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Temporary,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
