mod change;
mod entity;
pub mod name;

pub use self::{
    change::{ChangeKind, ChangeKindParseError, PendingChange},
    entity::{ETag, Entity, Properties, Property, TableEntity},
    name::{ResourceError, ResourceResult, TableName, validate_table_name},
};
