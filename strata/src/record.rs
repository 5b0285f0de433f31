//! JSON lines input for the `apply` command.
//!
//! Each line describes one pending change:
//!
//! ```json
//! {"table": "people", "kind": "added", "partition_key": "emea", "row_key": "1", "properties": {"name": "Ada"}}
//! ```

use serde::Deserialize;
use snafu::ResultExt;
use strata_core::{ChangeKind, Entity, PendingChange, Properties, Property, TableName};
use strata_writer::SaveChangesError;

use crate::error::{
    InvalidRecordSnafu, InvalidResourceNameSnafu, JsonParseSnafu, Result, SaveChangesSnafu,
};

#[derive(Debug, Deserialize)]
pub struct ChangeRecord {
    pub table: String,
    pub kind: String,
    #[serde(default)]
    pub partition_key: Option<String>,
    pub row_key: String,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ChangeRecord {
    pub fn into_change(self, line: usize) -> Result<PendingChange> {
        let table = TableName::new(self.table).context(InvalidResourceNameSnafu {
            resource: "table",
        })?;

        let kind = self
            .kind
            .parse::<ChangeKind>()
            .map_err(SaveChangesError::from)
            .context(SaveChangesSnafu {})?;

        let properties = self
            .properties
            .into_iter()
            .map(|(name, value)| -> Result<(String, Property)> {
                let property = property_from_json(&name, value, line)?;
                Ok((name, property))
            })
            .collect::<Result<Properties>>()?;

        let entity = Entity {
            partition_key: self.partition_key,
            row_key: self.row_key,
            etag: self.etag,
            properties,
        };

        Ok(PendingChange::new(table, kind, entity))
    }
}

fn property_from_json(name: &str, value: serde_json::Value, line: usize) -> Result<Property> {
    use serde_json::Value;

    match value {
        Value::String(value) => Ok(Property::String(value)),
        Value::Bool(value) => Ok(Property::Boolean(value)),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(Property::Int64(value))
            } else if let Some(value) = number.as_f64() {
                Ok(Property::Double(value))
            } else {
                InvalidRecordSnafu {
                    line,
                    message: format!("property {name} is out of range"),
                }
                .fail()
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => InvalidRecordSnafu {
            line,
            message: format!("property {name} must be a string, number or boolean"),
        }
        .fail(),
    }
}

/// Parses JSON lines into pending changes. Blank lines are skipped.
pub fn parse_changes(input: &str) -> Result<Vec<PendingChange>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| {
            let line = index + 1;
            let record: ChangeRecord = serde_json::from_str(text).context(JsonParseSnafu { line })?;
            record.into_change(line)
        })
        .collect()
}
