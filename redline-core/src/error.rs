use thiserror::Error;

/// Failures reported by a [`crate::remote::RemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The file does not exist (yet). Treated as transient while a file may
    /// still be in the middle of being created.
    #[error("file not found")]
    NotFound,
    #[error("access forbidden")]
    Forbidden,
    /// The request was superseded or abandoned. Not a failure.
    #[error("request cancelled")]
    Cancelled,
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Whether a fetch failing this way is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::NotFound | RemoteError::Forbidden)
    }
}

/// Failures of a [`crate::store::KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Crate-level error for operations that touch more than one port.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("malformed decision entry: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
