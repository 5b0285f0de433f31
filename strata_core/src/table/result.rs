use http::StatusCode;

use crate::resources::TableName;

use super::{OperationKind, WriteOperation};

/// Outcome of one operation as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub table: TableName,
    pub partition_key: String,
    pub row_key: String,
    pub operation: OperationKind,
    pub status: u16,
    /// Version of the row after a successful insert or replace.
    pub etag: Option<String>,
    pub message: Option<String>,
}

impl ItemResult {
    pub fn new(table: TableName, operation: &WriteOperation, status: StatusCode) -> Self {
        Self {
            table,
            partition_key: operation.partition_key().to_string(),
            row_key: operation.row_key().to_string(),
            operation: operation.kind(),
            status: status.as_u16(),
            etag: None,
            message: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

impl std::fmt::Display for ItemResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}/{}/{} returned {}",
            self.operation, self.table, self.partition_key, self.row_key, self.status
        )?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        Ok(())
    }
}
