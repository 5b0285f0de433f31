//! Type-safe table names.
//!
//! Table names follow the remote store's naming rules, so that a name that
//! validates here is never rejected by the store later on.

use serde::{Deserialize, Serialize};
use snafu::Snafu;

const MIN_TABLE_NAME_LEN: usize = 3;
const MAX_TABLE_NAME_LEN: usize = 63;

/// Errors that can occur when parsing resource names.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ResourceError {
    #[snafu(display(
        "invalid table name: '{name}' - must be 3 to 63 characters long, start with a letter, and contain only letters and numbers"
    ))]
    InvalidTableName { name: String },
}

pub type ResourceResult<T, E = ResourceError> = ::std::result::Result<T, E>;

/// Validate a table name.
///
/// Valid table names must:
/// - Be between 3 and 63 characters long
/// - Start with an ASCII letter
/// - Contain only ASCII letters and digits
pub fn validate_table_name(name: &str) -> ResourceResult<()> {
    let invalid = || ResourceError::InvalidTableName {
        name: name.to_string(),
    };

    if !(MIN_TABLE_NAME_LEN..=MAX_TABLE_NAME_LEN).contains(&name.len()) {
        return Err(invalid());
    }

    let mut chars = name.chars();

    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    if !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    Ok(())
}

/// The name of a table in the remote store.
///
/// The name keeps the casing it was created with. The store itself is
/// case-insensitive, use [`TableName::storage_key`] when addressing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName {
    name: String,
}

impl TableName {
    /// Create a new table name.
    pub fn new(name: impl Into<String>) -> ResourceResult<Self> {
        let name = name.into();
        validate_table_name(&name)?;
        Ok(Self { name })
    }

    /// Create a new table name without returning the validation error.
    ///
    /// # Panics
    ///
    /// Panics if the table name is invalid.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        let name = name.into();
        validate_table_name(&name).expect("table name must be valid");
        Self { name }
    }

    /// Get the table name as given.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The key used to address the table in storage.
    pub fn storage_key(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::str::FromStr for TableName {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = ResourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.name
    }
}
