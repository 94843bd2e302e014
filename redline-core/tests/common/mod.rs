//! Test doubles: an in-memory remote store with scriptable latency and
//! failures, and a key-value store that is always down.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use redline_core::{FetchedFile, KeyValueStore, RemoteError, RemoteStore, StoreError};

#[derive(Default)]
pub struct FakeRemote {
    /// Per-call latency for `persist`, consumed front to back.
    persist_delays: Mutex<VecDeque<Duration>>,
    persist_error: Mutex<Option<RemoteError>>,
    persisted: Mutex<Vec<String>>,
    fetch_results: Mutex<VecDeque<Result<FetchedFile, RemoteError>>>,
    fetch_calls: AtomicU32,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persist_delays(self, delays: &[u64]) -> Self {
        *self.persist_delays.lock().unwrap() =
            delays.iter().map(|ms| Duration::from_millis(*ms)).collect();
        self
    }

    pub fn failing_with(self, error: RemoteError) -> Self {
        *self.persist_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_fetch_results(
        self,
        results: impl IntoIterator<Item = Result<FetchedFile, RemoteError>>,
    ) -> Self {
        *self.fetch_results.lock().unwrap() = results.into_iter().collect();
        self
    }

    /// Contents of every persist that completed, in completion order.
    pub fn persisted(&self) -> Vec<String> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl RemoteStore for FakeRemote {
    async fn fetch(&self, _conversation_id: &str, _path: &str) -> Result<FetchedFile, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RemoteError::NotFound))
    }

    async fn persist(
        &self,
        _conversation_id: &str,
        _path: &str,
        content: &str,
    ) -> Result<(), RemoteError> {
        let delay = self.persist_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let error = self.persist_error.lock().unwrap().clone();
        if let Some(e) = error {
            return Err(e);
        }
        self.persisted.lock().unwrap().push(content.to_owned());
        Ok(())
    }
}

/// A retry policy fast enough for tests.
pub fn quick_policy(max_retries: u32) -> redline_core::RetryPolicy {
    redline_core::RetryPolicy {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        max_retries,
    }
}

/// A key-value store whose every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableKv;

fn unavailable() -> StoreError {
    StoreError::Unavailable("disk offline".into())
}

impl KeyValueStore for UnavailableKv {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }
}
