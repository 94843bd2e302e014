use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::store::KvWrite;

/// A review of one target file through one tool, resumed across runs.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,           // UUID v4 text
    pub target_path: String,
    pub tool: String,
    pub created_at: i64,      // Unix timestamp seconds
    pub updated_at: i64,      // Unix timestamp seconds
}

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// `busy_timeout` is set through the `Connection` method rather than a PRAGMA
/// string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    // Fold any WAL left behind by a previous run back into the main file.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Finds the most recent session for `target_path + tool`, or creates one.
///
/// On resume the session's `updated_at` is bumped; on create a new UUID v4 is
/// generated. Both writes run under `BEGIN IMMEDIATE`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query or write transaction fails.
pub async fn detect_or_create_session(
    conn: &Connection,
    target_path: &str,
    tool: &str,
) -> Result<SessionRecord, tokio_rusqlite::Error> {
    let target_path = target_path.to_owned();
    let tool = tool.to_owned();

    conn.call(move |db| {
        let existing: Option<SessionRecord> = db
            .query_row(
                "SELECT id, target_path, tool, created_at, updated_at
                 FROM review_sessions
                 WHERE target_path = ?1 AND tool = ?2
                 ORDER BY updated_at DESC
                 LIMIT 1",
                rusqlite::params![&target_path, &tool],
                |r| {
                    Ok(SessionRecord {
                        id: r.get(0)?,
                        target_path: r.get(1)?,
                        tool: r.get(2)?,
                        created_at: r.get(3)?,
                        updated_at: r.get(4)?,
                    })
                },
            )
            .optional()?;

        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let session = match existing {
            Some(mut session) => {
                tx.execute(
                    "UPDATE review_sessions SET updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, &session.id],
                )?;
                session.updated_at = now;
                session
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO review_sessions (id, target_path, tool, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    rusqlite::params![&id, &target_path, &tool, now],
                )?;
                SessionRecord {
                    id,
                    target_path,
                    tool,
                    created_at: now,
                    updated_at: now,
                }
            }
        };
        tx.commit()?;
        Ok::<_, rusqlite::Error>(session)
    })
    .await
}

/// Bumps `updated_at` for `session_id` so the next launch resumes it.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn update_session_timestamp(
    conn: &Connection,
    session_id: &str,
) -> Result<(), tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE review_sessions SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, &session_id],
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}

/// Reads the value stored under `key`, if any.
pub async fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, tokio_rusqlite::Error> {
    let key = key.to_owned();

    conn.call(move |db| {
        let value = db
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                rusqlite::params![&key],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok::<_, rusqlite::Error>(value)
    })
    .await
}

/// Writes `value` under `key`, replacing any previous value.
pub async fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), tokio_rusqlite::Error> {
    let key = key.to_owned();
    let value = value.to_owned();

    conn.call(move |db| {
        db.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key)
             DO UPDATE SET value = excluded.value,
                           updated_at = excluded.updated_at",
            rusqlite::params![&key, &value, now_secs()],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}

/// Deletes `key`. Missing keys are not an error.
pub async fn kv_remove(conn: &Connection, key: &str) -> Result<(), tokio_rusqlite::Error> {
    let key = key.to_owned();

    conn.call(move |db| {
        db.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![&key])?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}

/// Applies `writes` in one `BEGIN IMMEDIATE` transaction: all land or none.
pub async fn kv_write_batch(
    conn: &Connection,
    writes: Vec<KvWrite>,
) -> Result<(), tokio_rusqlite::Error> {
    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        for write in &writes {
            match write {
                KvWrite::Set { key, value } => {
                    tx.execute(
                        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key)
                         DO UPDATE SET value = excluded.value,
                                       updated_at = excluded.updated_at",
                        rusqlite::params![key, value, now],
                    )?;
                }
                KvWrite::Remove { key } => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}
