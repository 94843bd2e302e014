//! Durable decision storage.
//!
//! Decisions for one file live under two string keys, one per set, each
//! holding a JSON array of block ids. The key includes the conversation, the
//! tool and the file path because block ids alone repeat across files.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio_rusqlite::Connection;

use crate::db;
use crate::decision::DecisionState;
use crate::error::{Result, StoreError};

/// One write of a [`KeyValueStore::write_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

/// Narrow key-value persistence port.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Applies `writes` in order. Stores that can should apply them all or
    /// none; the default applies them one by one and stops at the first
    /// error.
    fn write_batch(
        &self,
        writes: Vec<KvWrite>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            for write in writes {
                match write {
                    KvWrite::Set { key, value } => self.set(&key, &value).await?,
                    KvWrite::Remove { key } => self.remove(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// SQLite-backed store over the `kv` table.
#[derive(Clone)]
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(db::kv_get(&self.conn, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(db::kv_set(&self.conn, key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Ok(db::kv_remove(&self.conn, key).await?)
    }

    async fn write_batch(&self, writes: Vec<KvWrite>) -> Result<(), StoreError> {
        Ok(db::kv_write_batch(&self.conn, writes).await?)
    }
}

/// In-process store. Nothing survives the process; clones share entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    async fn write_batch(&self, writes: Vec<KvWrite>) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for write in writes {
            match write {
                KvWrite::Set { key, value } => {
                    entries.insert(key, value);
                }
                KvWrite::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Identifies the decisions of one file within one conversation and tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    pub conversation_id: String,
    pub tool: String,
    pub path: String,
}

impl DecisionKey {
    pub fn new(conversation_id: &str, tool: &str, path: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_owned(),
            tool: tool.to_owned(),
            path: path.to_owned(),
        }
    }

    pub fn rejected_key(&self) -> String {
        self.key_for("rejected")
    }

    pub fn accepted_key(&self) -> String {
        self.key_for("accepted")
    }

    fn key_for(&self, set: &str) -> String {
        format!(
            "redline:{set}:{}:{}:{}",
            escape_part(&self.conversation_id),
            escape_part(&self.tool),
            escape_part(&self.path)
        )
    }
}

/// Percent-encodes `%` and `:` so parts containing the separator cannot
/// collide. Parts without either character are unchanged.
fn escape_part(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

/// Reads and writes the decision sets of one file.
pub struct DecisionStore<S> {
    kv: S,
    key: DecisionKey,
}

impl<S: KeyValueStore> DecisionStore<S> {
    pub fn new(kv: S, key: DecisionKey) -> Self {
        Self { kv, key }
    }

    /// Loads both sets. Never fails: a missing, unreadable or malformed entry
    /// counts as an empty set.
    pub async fn load(&self) -> DecisionState {
        let accepted = self.load_set(&self.key.accepted_key()).await;
        let rejected = self.load_set(&self.key.rejected_key()).await;
        DecisionState::from_sets(accepted, rejected)
    }

    async fn load_set(&self, key: &str) -> BTreeSet<String> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeSet::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "decision store read failed, starting empty");
                return BTreeSet::new();
            }
        };
        decode_set(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "ignoring malformed decision entry");
            BTreeSet::new()
        })
    }

    /// Writes both sets in one batch. An empty set removes its key instead of
    /// storing `[]`.
    ///
    /// # Errors
    ///
    /// Returns the `StoreError` of the batch. With [`SqliteKv`] nothing is
    /// written in that case.
    pub async fn save(&self, state: &DecisionState) -> Result<(), StoreError> {
        let writes = vec![
            set_write(self.key.rejected_key(), state.rejected()),
            set_write(self.key.accepted_key(), state.accepted()),
        ];
        self.kv.write_batch(writes).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.save(&DecisionState::new()).await
    }
}

fn set_write(key: String, ids: &BTreeSet<String>) -> KvWrite {
    if ids.is_empty() {
        KvWrite::Remove { key }
    } else {
        KvWrite::Set {
            key,
            value: encode_set(ids),
        }
    }
}

fn encode_set(ids: &BTreeSet<String>) -> String {
    // A list of strings always serializes.
    serde_json::to_string(ids).unwrap_or_else(|_| String::from("[]"))
}

fn decode_set(raw: &str) -> Result<BTreeSet<String>> {
    let ids: Vec<String> = serde_json::from_str(raw)?;
    Ok(ids.into_iter().collect())
}
