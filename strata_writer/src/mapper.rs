use strata_core::{ChangeKind, ETag, PendingChange, WriteOperation};

/// Maps a pending change to the write that persists it.
///
/// Returns `None` for changes that need no write. Replaces and deletes
/// without a concurrency token are unconditional.
pub fn map_change(change: &PendingChange) -> Option<WriteOperation> {
    let entity = change.entity.clone();

    match change.kind {
        ChangeKind::Added => Some(WriteOperation::Insert { entity }),
        ChangeKind::Modified => {
            let etag = ETag::from_optional(entity.etag.as_deref());
            Some(WriteOperation::Replace { entity, etag })
        }
        ChangeKind::Deleted => {
            let etag = ETag::from_optional(entity.etag.as_deref());
            Some(WriteOperation::Delete { entity, etag })
        }
        ChangeKind::Unchanged | ChangeKind::Unknown => None,
    }
}
