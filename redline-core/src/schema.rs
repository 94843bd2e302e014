/// DDL for the schema_version tracking table.
///
/// Applied on every open before the version is read. `IF NOT EXISTS` keeps it
/// safe to run repeatedly.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// - `kv`: durable string key-value entries. Decision sets live here as JSON
///   arrays, one row per (set, conversation, tool, path) key.
/// - `review_sessions`: one row per reviewed target file and tool. The UUID id
///   doubles as the conversation identifier inside decision keys.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS kv (
        key         TEXT    PRIMARY KEY,
        value       TEXT    NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS review_sessions (
        id          TEXT    PRIMARY KEY,
        target_path TEXT    NOT NULL,
        tool        TEXT    NOT NULL,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS review_sessions_target
        ON review_sessions (target_path, tool, updated_at);
";

/// Brings the database up to the latest schema version.
///
/// Idempotent. Reads the current version (`0` when the table is empty) and
/// applies each missing step inside a `BEGIN IMMEDIATE` transaction.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
