//! Port to the authoritative file store, plus the bounded-retry fetch.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::RemoteError;

/// Content returned by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedFile {
    Text(String),
    /// Content that cannot be shown inline; offer a download instead.
    Binary { download_url: String, filename: String },
}

/// Cancellable remote read/write of whole files.
///
/// Writes always carry the complete file; there are no partial updates.
pub trait RemoteStore: Send + Sync + 'static {
    fn fetch(
        &self,
        conversation_id: &str,
        path: &str,
    ) -> impl Future<Output = Result<FetchedFile, RemoteError>> + Send;

    fn persist(
        &self,
        conversation_id: &str,
        path: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Capped doubling backoff for fetches that may race a file's creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    /// 350 ms doubling up to 4 s, at most 6 retries.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(350),
            max_delay: Duration::from_millis(4000),
            max_retries: 6,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// What the front end can show for the original file at any moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    /// A transient failure is being retried.
    Retrying { attempt: u32 },
    Ready,
    Binary { download_url: String, filename: String },
    Failed(String),
}

/// Fetches `path`, retrying not-found and forbidden answers with `policy`.
///
/// Returns [`RemoteError::Cancelled`] as soon as `cancel` fires, including
/// while waiting between attempts. Any other error is returned at once.
///
/// `on_retry` is called with the 1-based retry number before each wait.
pub async fn fetch_with_retry<R, F>(
    remote: &R,
    conversation_id: &str,
    path: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut on_retry: F,
) -> Result<FetchedFile, RemoteError>
where
    R: RemoteStore,
    F: FnMut(u32),
{
    let mut retry = 0u32;
    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RemoteError::Cancelled),
            r = remote.fetch(conversation_id, path) => r,
        };

        match result {
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                retry += 1;
                tracing::debug!(path, retry, ?delay, error = %e, "fetch failed, retrying");
                on_retry(retry);
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(RemoteError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            other => return other,
        }
    }
}
