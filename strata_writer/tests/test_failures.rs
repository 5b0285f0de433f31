mod common;

use std::sync::Arc;

use http::StatusCode;
use strata_core::{Entity, PendingChange, TableStoreError};
use strata_observability::ErrorKind;
use strata_writer::{ChangeWriter, SaveChangesError, WriteMode, WriterOptions};
use tokio_util::sync::CancellationToken;

use crate::common::{ScriptedTableStore, added, added_many, people, unavailable};

fn writer(store: &ScriptedTableStore) -> ChangeWriter {
    ChangeWriter::new(Arc::new(store.clone()), WriterOptions::default()).expect("writer")
}

#[tokio::test]
async fn test_transport_error_wins_over_rejected_rows() {
    let store = ScriptedTableStore::new()
        .with_rejected_row("bad", StatusCode::CONFLICT)
        .with_failing_table("orders", unavailable());
    let writer = writer(&store);

    let changes = vec![
        added("people", "a", "bad"),
        added("people", "b", "good"),
        added("orders", "a", "1"),
    ];

    let err = writer
        .save_changes(&changes, CancellationToken::new())
        .await
        .unwrap_err();

    let SaveChangesError::Transport { table, source } = &err else {
        panic!("expected transport error, got {err:?}");
    };
    assert_eq!(table.as_str(), "orders");
    assert!(matches!(source, TableStoreError::Internal { .. }));

    // Every submission ran to completion before the error was returned.
    assert_eq!(store.submissions(), 3);
    assert_eq!(store.row_count("people").await, 1);
}

#[tokio::test]
async fn test_unresolvable_table_does_not_stop_other_tables() {
    let store = ScriptedTableStore::new().with_unavailable_table("orders", unavailable());
    let writer = writer(&store);

    let mut changes = added_many("orders", "a", 150);
    changes.extend(added_many("people", "a", 10));

    let err = writer
        .save_changes(&changes, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.kind(), ErrorKind::Internal);

    // None of the orders batches reached the store, people was written.
    assert_eq!(store.submissions(), 1);
    assert_eq!(store.row_count("people").await, 10);
}

#[tokio::test]
async fn test_missing_partition_key_submits_nothing() {
    let store = ScriptedTableStore::new();
    let writer = writer(&store);

    let orphan = PendingChange::added(
        people(),
        Entity {
            row_key: "orphan".to_string(),
            ..Default::default()
        },
    );
    let changes = vec![added("people", "a", "1"), orphan];

    let err = writer
        .save_changes(&changes, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SaveChangesError::MissingPartitionKey { ref row_key, .. } if row_key == "orphan"
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.submissions(), 0);
}

#[tokio::test]
async fn test_single_mode_reports_first_rejected_operation() {
    let store = ScriptedTableStore::new().with_rejected_row("r2", StatusCode::NOT_FOUND);
    let writer = ChangeWriter::new(
        Arc::new(store.clone()),
        WriterOptions::new().with_mode(WriteMode::Single),
    )
    .unwrap();

    let changes = vec![
        added("people", "a", "r1"),
        added("people", "a", "r2"),
        added("people", "a", "r3"),
    ];

    let err = writer
        .save_changes(&changes, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.item().unwrap().row_key, "r2");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Single operations are not atomic, the others were applied.
    assert_eq!(store.submissions(), 3);
    assert_eq!(store.row_count("people").await, 2);
}
