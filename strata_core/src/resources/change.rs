use serde::{Deserialize, Serialize};
use snafu::Snafu;

use super::{Entity, TableEntity, TableName};

/// The state a change tracker assigned to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("unhandled change kind: {kind}"))]
pub struct ChangeKindParseError {
    pub kind: String,
}

impl std::str::FromStr for ChangeKind {
    type Err = ChangeKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            "deleted" => Ok(Self::Deleted),
            "unchanged" => Ok(Self::Unchanged),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ChangeKindParseError {
                kind: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// One tracked entity together with what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub table: TableName,
    pub kind: ChangeKind,
    pub entity: Entity,
}

impl PendingChange {
    pub fn new(table: TableName, kind: ChangeKind, entity: Entity) -> Self {
        Self {
            table,
            kind,
            entity,
        }
    }

    pub fn from_entity(table: TableName, kind: ChangeKind, entity: &impl TableEntity) -> Self {
        Self::new(table, kind, Entity::from_entity(entity))
    }

    pub fn added(table: TableName, entity: Entity) -> Self {
        Self::new(table, ChangeKind::Added, entity)
    }

    pub fn modified(table: TableName, entity: Entity) -> Self {
        Self::new(table, ChangeKind::Modified, entity)
    }

    pub fn deleted(table: TableName, entity: Entity) -> Self {
        Self::new(table, ChangeKind::Deleted, entity)
    }

    pub fn partition_key(&self) -> Option<&str> {
        self.entity.partition_key.as_deref()
    }

    pub fn row_key(&self) -> &str {
        &self.entity.row_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_change_kind_ignores_case() {
        assert_eq!("added".parse::<ChangeKind>(), Ok(ChangeKind::Added));
        assert_eq!("Modified".parse::<ChangeKind>(), Ok(ChangeKind::Modified));
        assert_eq!("DELETED".parse::<ChangeKind>(), Ok(ChangeKind::Deleted));
        assert_eq!("Unchanged".parse::<ChangeKind>(), Ok(ChangeKind::Unchanged));
        assert_eq!("unknown".parse::<ChangeKind>(), Ok(ChangeKind::Unknown));
    }

    #[test]
    fn test_parse_unhandled_change_kind() {
        let err = "Detached".parse::<ChangeKind>().unwrap_err();
        assert_eq!(err.kind, "Detached");
        assert_eq!(err.to_string(), "unhandled change kind: Detached");
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for kind in [
            ChangeKind::Added,
            ChangeKind::Modified,
            ChangeKind::Deleted,
            ChangeKind::Unchanged,
            ChangeKind::Unknown,
        ] {
            assert_eq!(kind.to_string().parse::<ChangeKind>(), Ok(kind));
        }
    }
}
