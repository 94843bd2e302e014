//! A [`RemoteStore`] over the local filesystem.
//!
//! Fetches read the file at the given path. Pushes write the complete
//! reviewed content to a separate output file, replacing it atomically so a
//! reader never sees half a file.
//!
//! A push that is superseded keeps running on the blocking pool after its
//! future is dropped, so the final rename is gated: under one lock, only the
//! newest write may replace the output. A write that loses the race deletes
//! its temp file instead.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use redline_core::{FetchedFile, RemoteError, RemoteStore};
use tempfile::NamedTempFile;

pub struct FsRemote {
    output: PathBuf,
    /// Number of the most recently started write.
    latest: Arc<AtomicU64>,
    /// Serializes the check-then-rename step.
    gate: Arc<Mutex<()>>,
}

impl FsRemote {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            latest: Arc::new(AtomicU64::new(0)),
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

fn map_io(e: std::io::Error) -> RemoteError {
    match e.kind() {
        ErrorKind::NotFound => RemoteError::NotFound,
        ErrorKind::PermissionDenied => RemoteError::Forbidden,
        _ => RemoteError::Transport(e.to_string()),
    }
}

/// Text is anything that decodes as UTF-8 and holds no NUL byte.
fn classify(path: &Path, bytes: Vec<u8>) -> FetchedFile {
    if !bytes.contains(&0) {
        if let Ok(text) = String::from_utf8(bytes) {
            return FetchedFile::Text(text);
        }
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    FetchedFile::Binary {
        download_url: format!("file://{}", absolute.display()),
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Writes `content` next to `output` and renames it over `output`, unless a
/// write newer than `write` has started by then.
///
/// Returns `Ok(false)` when the write was skipped. The temp file is removed
/// on every path except a successful rename.
fn write_if_latest(
    output: &Path,
    content: &str,
    write: u64,
    latest: &AtomicU64,
    gate: &Mutex<()>,
) -> std::io::Result<bool> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    let _guard = gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if latest.load(Ordering::SeqCst) != write {
        return Ok(false);
    }
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(true)
}

impl RemoteStore for FsRemote {
    async fn fetch(&self, _conversation_id: &str, path: &str) -> Result<FetchedFile, RemoteError> {
        let path = Path::new(path);
        let bytes = tokio::fs::read(path).await.map_err(map_io)?;
        Ok(classify(path, bytes))
    }

    async fn persist(
        &self,
        _conversation_id: &str,
        _path: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        let write = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let output = self.output.clone();
        let content = content.to_owned();
        let latest = Arc::clone(&self.latest);
        let gate = Arc::clone(&self.gate);

        let bytes = content.len();
        let landed = tokio::task::spawn_blocking(move || {
            write_if_latest(&output, &content, write, &latest, &gate)
        })
        .await
        .map_err(|e| RemoteError::Transport(format!("write task: {e}")))?
        .map_err(map_io)?;

        if !landed {
            tracing::debug!(write, "superseded write skipped");
            return Err(RemoteError::Cancelled);
        }
        tracing::debug!(output = %self.output.display(), bytes, "reviewed content written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn fetch_reads_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "hello\n").unwrap();

        let remote = FsRemote::new(dir.path().join("out"));
        let fetched = remote.fetch("conv", path.to_str().unwrap()).await.unwrap();
        assert_eq!(fetched, FetchedFile::Text("hello\n".into()));
    }

    #[tokio::test]
    async fn fetch_flags_binary_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 1]).unwrap();

        let remote = FsRemote::new(dir.path().join("out"));
        match remote.fetch("conv", path.to_str().unwrap()).await.unwrap() {
            FetchedFile::Binary { download_url, filename } => {
                assert_eq!(filename, "logo.png");
                assert!(download_url.starts_with("file://"));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let remote = FsRemote::new(dir.path().join("out"));
        let missing = dir.path().join("missing.md");
        let err = remote.fetch("conv", missing.to_str().unwrap()).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound);
    }

    #[tokio::test]
    async fn persist_replaces_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("notes.md.reviewed");
        let remote = FsRemote::new(out.clone());

        remote.persist("conv", "notes.md", "v1").await.unwrap();
        remote.persist("conv", "notes.md", "v2").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "v2");
        assert_eq!(entries(dir.path()), vec!["notes.md.reviewed".to_owned()]);
    }

    #[test]
    fn stale_write_is_skipped_and_cleaned_up() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("notes.md.reviewed");
        std::fs::write(&out, "newer").unwrap();

        let latest = AtomicU64::new(2);
        let gate = Mutex::new(());
        let landed = write_if_latest(&out, "older", 1, &latest, &gate).unwrap();

        assert!(!landed);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "newer");
        assert_eq!(entries(dir.path()), vec!["notes.md.reviewed".to_owned()]);
    }

    #[tokio::test]
    async fn overlapping_writes_leave_the_newest() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("notes.md.reviewed");
        let remote = FsRemote::new(out.clone());

        let big = "x".repeat(4 * 1024 * 1024);
        let (first, second) = tokio::join!(
            remote.persist("conv", "notes.md", &big),
            remote.persist("conv", "notes.md", "small"),
        );

        assert!(matches!(first, Ok(()) | Err(RemoteError::Cancelled)));
        assert_eq!(second, Ok(()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "small");
        assert_eq!(entries(dir.path()), vec!["notes.md.reviewed".to_owned()]);
    }

    #[tokio::test]
    async fn dropped_push_does_not_clobber_a_newer_one() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("notes.md.reviewed");
        let remote = FsRemote::new(out.clone());

        let big = "x".repeat(4 * 1024 * 1024);
        // Start the slow write, then abandon it the way a superseded push is.
        {
            let slow = remote.persist("conv", "notes.md", &big);
            tokio::pin!(slow);
            let _ = tokio::time::timeout(std::time::Duration::from_millis(1), &mut slow).await;
        }
        remote.persist("conv", "notes.md", "small").await.unwrap();

        // Let the abandoned blocking write run to completion.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "small");
        assert_eq!(entries(dir.path()), vec!["notes.md.reviewed".to_owned()]);
    }
}
