use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed property value stored in a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Property {
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Binary(Vec<u8>),
}

pub type Properties = BTreeMap<String, Property>;

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for Property {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Property {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Uuid> for Property {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

/// Concurrency token attached to a conditional write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ETag {
    /// Matches any stored version, written as `*`.
    Any,
    Value(String),
}

impl ETag {
    /// Converts an optional token into a condition, where no token means `Any`.
    pub fn from_optional(token: Option<&str>) -> Self {
        match token {
            None | Some("*") => Self::Any,
            Some(value) => Self::Value(value.to_string()),
        }
    }

    /// Whether this condition is satisfied by the stored version.
    pub fn matches(&self, current: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Value(value) => value == current,
        }
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// A domain value that can be written to a table.
///
/// The partition key is optional because callers may hand over values
/// that were never assigned one. The writer rejects those before anything
/// is submitted.
pub trait TableEntity {
    fn partition_key(&self) -> Option<&str>;

    fn row_key(&self) -> &str;

    fn etag(&self) -> Option<&str> {
        None
    }

    fn properties(&self) -> Properties;
}

/// Snapshot of an entity at the time its change was recorded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub partition_key: Option<String>,
    pub row_key: String,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl Entity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: Some(partition_key.into()),
            row_key: row_key.into(),
            etag: None,
            properties: Properties::new(),
        }
    }

    pub fn from_entity(entity: &impl TableEntity) -> Self {
        Self {
            partition_key: entity.partition_key().map(str::to_string),
            row_key: entity.row_key().to_string(),
            etag: entity.etag().map(str::to_string),
            properties: entity.properties(),
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Property>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

impl TableEntity for Entity {
    fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }

    fn row_key(&self) -> &str {
        &self.row_key
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    fn properties(&self) -> Properties {
        self.properties.clone()
    }
}
