//! Integration test for the SQLite-backed decision store.
//!
//! Exercises: open_db, migrate, detect_or_create_session,
//! update_session_timestamp, kv_get/kv_set/kv_remove, kv_write_batch,
//! DecisionStore.

mod common;

use common::UnavailableKv;
use redline_core::db;
use redline_core::store::{
    DecisionKey, DecisionStore, KeyValueStore, KvWrite, MemoryKv, SqliteKv,
};
use redline_core::DecisionState;

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

async fn kv_row_count(conn: &tokio_rusqlite::Connection) -> i64 {
    conn.call(|db| {
        Ok::<_, rusqlite::Error>(db.query_row("SELECT COUNT(*) FROM kv", [], |r| r.get(0))?)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn schema_and_sessions() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    assert_eq!(kv_row_count(&conn).await, 0, "kv table should exist and be empty");

    let session = db::detect_or_create_session(&conn, "/tmp/notes.md", "write_file")
        .await
        .unwrap();
    assert!(!session.id.is_empty(), "session ID should be non-empty UUID");
    assert_eq!(session.target_path, "/tmp/notes.md");
    assert_eq!(session.tool, "write_file");

    let resumed = db::detect_or_create_session(&conn, "/tmp/notes.md", "write_file")
        .await
        .unwrap();
    assert_eq!(resumed.id, session.id, "should resume same session");

    let other_tool = db::detect_or_create_session(&conn, "/tmp/notes.md", "apply_edits")
        .await
        .unwrap();
    assert_ne!(other_tool.id, session.id, "different tool = new session");

    db::update_session_timestamp(&conn, &session.id).await.unwrap();

    // Reopening runs the migration again without touching existing rows.
    let conn2 = db::open_db(&path).await.unwrap();
    let again = db::detect_or_create_session(&conn2, "/tmp/notes.md", "write_file")
        .await
        .unwrap();
    assert_eq!(again.id, session.id, "session should persist across connections");
}

#[tokio::test]
async fn kv_roundtrip() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();

    assert_eq!(db::kv_get(&conn, "missing").await.unwrap(), None);

    db::kv_set(&conn, "k", "v1").await.unwrap();
    db::kv_set(&conn, "k", "v2").await.unwrap();
    assert_eq!(db::kv_get(&conn, "k").await.unwrap().as_deref(), Some("v2"));
    assert_eq!(kv_row_count(&conn).await, 1, "upsert keeps a single row");

    db::kv_remove(&conn, "k").await.unwrap();
    db::kv_remove(&conn, "k").await.unwrap();
    assert_eq!(db::kv_get(&conn, "k").await.unwrap(), None);
}

#[tokio::test]
async fn decisions_persist_in_sqlite() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();
    let key = DecisionKey::new("conv-1", "write_file", "src/lib.rs");
    let store = DecisionStore::new(SqliteKv::new(conn.clone()), key.clone());

    assert!(store.load().await.is_empty(), "fresh store loads empty");

    let state = DecisionState::new().accept("cb-o2").reject("cb-n9");
    store.save(&state).await.unwrap();
    assert_eq!(kv_row_count(&conn).await, 2);

    let raw = db::kv_get(&conn, &key.rejected_key()).await.unwrap().unwrap();
    assert_eq!(raw, r#"["cb-n9"]"#);

    // A second connection sees the same decisions.
    let conn2 = db::open_db(&path).await.unwrap();
    let reopened = DecisionStore::new(SqliteKv::new(conn2), key.clone());
    assert_eq!(reopened.load().await, state);

    // Emptying a set removes its key instead of storing [].
    store.save(&state.undo("cb-n9")).await.unwrap();
    assert_eq!(db::kv_get(&conn, &key.rejected_key()).await.unwrap(), None);
    assert_eq!(kv_row_count(&conn).await, 1);

    store.clear().await.unwrap();
    assert_eq!(kv_row_count(&conn).await, 0);
}

#[tokio::test]
async fn keys_separate_files_and_tools() {
    let a = DecisionKey::new("conv", "write_file", "a.txt");
    let b = DecisionKey::new("conv", "write_file", "b.txt");
    let c = DecisionKey::new("conv", "apply_edits", "a.txt");
    assert_ne!(a.accepted_key(), b.accepted_key());
    assert_ne!(a.accepted_key(), c.accepted_key());
    assert_ne!(a.accepted_key(), a.rejected_key());

    let kv = MemoryKv::new();
    let store_a = DecisionStore::new(kv.clone(), a);
    store_a.save(&DecisionState::new().reject("cb-o1")).await.unwrap();
    let store_b = DecisionStore::new(kv.clone(), b);
    assert!(store_b.load().await.is_empty());
    assert_eq!(kv.len(), 1);
}

#[test]
fn separators_inside_parts_cannot_collide() {
    let a = DecisionKey::new("conv", "a:b", "c");
    let b = DecisionKey::new("conv", "a", "b:c");
    assert_ne!(a.accepted_key(), b.accepted_key());
    assert_eq!(a.accepted_key(), "redline:accepted:conv:a%3Ab:c");

    // Already-escaped text stays distinct from the escape of a separator.
    let c = DecisionKey::new("conv", "a%3Ab", "c");
    assert_ne!(a.accepted_key(), c.accepted_key());

    let plain = DecisionKey::new("conv-1", "write_file", "src/lib.rs");
    assert_eq!(
        plain.rejected_key(),
        "redline:rejected:conv-1:write_file:src/lib.rs"
    );
}

#[tokio::test]
async fn failed_batch_writes_nothing() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    db::kv_set(&conn, "keep", "old").await.unwrap();
    conn.call(|db| {
        db.execute_batch(
            "CREATE TRIGGER refuse_boom BEFORE INSERT ON kv WHEN NEW.key = 'boom'
             BEGIN SELECT RAISE(ABORT, 'refused'); END;",
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .unwrap();

    let result = db::kv_write_batch(
        &conn,
        vec![
            KvWrite::Remove { key: "keep".into() },
            KvWrite::Set { key: "fresh".into(), value: "1".into() },
            KvWrite::Set { key: "boom".into(), value: "2".into() },
        ],
    )
    .await;

    assert!(result.is_err());
    assert_eq!(db::kv_get(&conn, "keep").await.unwrap().as_deref(), Some("old"));
    assert_eq!(db::kv_get(&conn, "fresh").await.unwrap(), None);
}

#[tokio::test]
async fn moving_a_decision_updates_both_sets_together() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    let key = DecisionKey::new("conv", "write_file", "notes.md");
    let store = DecisionStore::new(SqliteKv::new(conn.clone()), key.clone());

    let rejected = DecisionState::new().reject("cb-o2");
    store.save(&rejected).await.unwrap();
    store.save(&rejected.accept("cb-o2")).await.unwrap();

    assert_eq!(db::kv_get(&conn, &key.rejected_key()).await.unwrap(), None);
    assert_eq!(
        db::kv_get(&conn, &key.accepted_key()).await.unwrap().as_deref(),
        Some(r#"["cb-o2"]"#)
    );
}

#[tokio::test]
async fn unavailable_store_loads_empty_and_reports_saves() {
    let store = DecisionStore::new(
        UnavailableKv,
        DecisionKey::new("conv", "write_file", "notes.md"),
    );
    assert!(store.load().await.is_empty());

    let err = store
        .save(&DecisionState::new().accept("cb-o2"))
        .await
        .unwrap_err();
    assert!(matches!(err, redline_core::StoreError::Unavailable(_)));
}

#[tokio::test]
async fn malformed_entries_load_as_empty() {
    let key = DecisionKey::new("conv", "write_file", "notes.md");
    let kv = MemoryKv::new();
    kv.set(&key.rejected_key(), "not json").await.unwrap();
    kv.set(&key.accepted_key(), r#"["cb-o4"]"#).await.unwrap();

    let store = DecisionStore::new(kv, key);
    let state = store.load().await;
    assert!(state.rejected().is_empty());
    assert!(state.accepted().contains("cb-o4"));
}
