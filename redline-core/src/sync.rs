//! Pushes reconstructed content to the remote store.
//!
//! Each file has at most one push in flight. Starting a new push cancels the
//! previous one through its token, and a push whose generation is no longer
//! the latest can never update the controller's notion of current content,
//! even if its request completes late. Failures are logged and swallowed:
//! the next push carries the newest state anyway.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RemoteError;
use crate::remote::RemoteStore;

/// Outcome of one push, for front ends that show sync status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The push landed and is now the current remote content.
    Pushed { generation: u64 },
    /// The push failed. Local state is kept as is.
    Failed { generation: u64, error: String },
    /// The push was superseded or cancelled. Not an error.
    Cancelled { generation: u64 },
}

#[derive(Debug, Default)]
struct Shared {
    latest: u64,
    current: Option<String>,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct SyncController<R> {
    remote: Arc<R>,
    conversation_id: String,
    path: String,
    shared: Arc<Mutex<Shared>>,
    inflight: Option<InFlight>,
    events: Option<UnboundedSender<SyncEvent>>,
}

impl<R: RemoteStore> SyncController<R> {
    pub fn new(remote: Arc<R>, conversation_id: &str, path: &str) -> Self {
        Self {
            remote,
            conversation_id: conversation_id.to_owned(),
            path: path.to_owned(),
            shared: Arc::new(Mutex::new(Shared::default())),
            inflight: None,
            events: None,
        }
    }

    /// Reports every push outcome on `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<SyncEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }

    /// Seeds the current content, typically with what was just fetched.
    pub fn set_current(&self, content: &str) {
        self.lock().current = Some(content.to_owned());
    }

    /// The last content known to be stored remotely.
    pub fn current_content(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Generation of the most recent push, `0` before the first.
    pub fn latest_generation(&self) -> u64 {
        self.lock().latest
    }

    pub fn is_syncing(&self) -> bool {
        self.inflight
            .as_ref()
            .is_some_and(|f| !f.handle.is_finished())
    }

    /// Starts pushing `content`, superseding any push still in flight.
    ///
    /// Must be called from within a tokio runtime. Returns the generation
    /// assigned to this push.
    pub fn push(&mut self, content: String) -> u64 {
        self.cancel();

        let generation = {
            let mut shared = self.lock();
            shared.latest += 1;
            shared.latest
        };

        let cancel = CancellationToken::new();
        let task = PushTask {
            remote: Arc::clone(&self.remote),
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            conversation_id: self.conversation_id.clone(),
            path: self.path.clone(),
            content,
            generation,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run());

        tracing::debug!(path = %self.path, generation, "push started");
        self.inflight = Some(InFlight {
            generation,
            cancel,
            handle,
        });
        generation
    }

    /// Cancels the push in flight, if any. Its result will be discarded.
    pub fn cancel(&mut self) {
        if let Some(prev) = self.inflight.take() {
            if !prev.handle.is_finished() {
                tracing::debug!(path = %self.path, generation = prev.generation, "superseding push");
            }
            prev.cancel.cancel();
        }
    }

    /// Waits for the latest push to finish, whatever its outcome.
    pub async fn settle(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            if let Err(e) = inflight.handle.await {
                tracing::warn!(path = %self.path, error = %e, "push task aborted");
            }
        }
    }
}

impl<R> Drop for SyncController<R> {
    fn drop(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            inflight.cancel.cancel();
        }
    }
}

fn lock_shared(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct PushTask<R> {
    remote: Arc<R>,
    shared: Arc<Mutex<Shared>>,
    events: Option<UnboundedSender<SyncEvent>>,
    conversation_id: String,
    path: String,
    content: String,
    generation: u64,
    cancel: CancellationToken,
}

impl<R: RemoteStore> PushTask<R> {
    async fn run(self) {
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(RemoteError::Cancelled),
            r = self.remote.persist(&self.conversation_id, &self.path, &self.content) => r,
        };

        let generation = self.generation;
        let event = match result {
            Ok(()) => {
                let mut shared = lock_shared(&self.shared);
                if shared.latest == generation && !self.cancel.is_cancelled() {
                    shared.current = Some(self.content.clone());
                    SyncEvent::Pushed { generation }
                } else {
                    tracing::debug!(path = %self.path, generation, "discarding late push result");
                    SyncEvent::Cancelled { generation }
                }
            }
            Err(RemoteError::Cancelled) => {
                tracing::debug!(path = %self.path, generation, "push cancelled");
                SyncEvent::Cancelled { generation }
            }
            Err(e) => {
                tracing::warn!(path = %self.path, generation, error = %e, "push failed");
                SyncEvent::Failed {
                    generation,
                    error: e.to_string(),
                }
            }
        };

        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
