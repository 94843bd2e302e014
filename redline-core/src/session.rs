//! One reviewer's view of one file: diff, decisions, storage and sync wired
//! together.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::decision::{Action, Decision, DecisionState};
use crate::diff::compute_diff_hunks;
use crate::error::RemoteError;
use crate::reconstruct::{
    block_line_ranges, line_diff_map, live_lines, preview_lines, reconstruct, review_stats,
    BlockRange, Mode, PlaceholderResolver, PreviewLine, ReviewStats,
};
use crate::remote::{fetch_with_retry, FetchedFile, LoadState, RemoteStore, RetryPolicy};
use crate::segment::{block_ids, compute_full_file_segments};
use crate::store::{DecisionStore, KeyValueStore};
use crate::sync::SyncController;
use crate::types::{DiffSummary, LineKind, Segment};

pub struct ReviewSession<R, S> {
    original: String,
    proposed: String,
    summary: DiffSummary,
    segments: Vec<Segment>,
    block_ids: Vec<String>,
    state: DecisionState,
    store: DecisionStore<S>,
    sync: SyncController<R>,
}

impl<R: RemoteStore, S: KeyValueStore> ReviewSession<R, S> {
    /// Diffs `original` against `proposed` and restores any saved decisions.
    ///
    /// Nothing is pushed on open; the first push happens on the first change.
    pub async fn open(
        original: String,
        proposed: String,
        context_lines: usize,
        store: DecisionStore<S>,
        sync: SyncController<R>,
    ) -> Self {
        let summary = compute_diff_hunks(&original, &proposed, context_lines);
        let segments = compute_full_file_segments(&original, &proposed, &summary.hunks);
        let block_ids = block_ids(&segments);
        let state = store.load().await;

        tracing::info!(
            path = %sync.path(),
            blocks = block_ids.len(),
            additions = summary.additions,
            deletions = summary.deletions,
            "review session opened"
        );

        Self {
            original,
            proposed,
            summary,
            segments,
            block_ids,
            state,
            store,
            sync,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn proposed(&self) -> &str {
        &self.proposed
    }

    pub fn summary(&self) -> &DiffSummary {
        &self.summary
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn block_ids(&self) -> &[String] {
        &self.block_ids
    }

    pub fn state(&self) -> &DecisionState {
        &self.state
    }

    pub fn decision(&self, id: &str) -> Decision {
        self.state.decision(id)
    }

    pub fn sync(&self) -> &SyncController<R> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncController<R> {
        &mut self.sync
    }

    /// Applies a reviewer action.
    ///
    /// When the decisions actually change they are persisted, and the new live
    /// content is pushed to the remote store. A failed store write is logged
    /// and the in-memory state kept. Returns whether anything changed.
    pub async fn apply(&mut self, action: Action) -> bool {
        let next = self.state.apply(&action, &self.block_ids);
        if next == self.state {
            return false;
        }
        self.state = next;

        if let Err(e) = self.store.save(&self.state).await {
            tracing::warn!(
                path = %self.sync.path(),
                error = %e,
                ?action,
                "failed to persist decisions"
            );
        }

        let content = self.live_content();
        self.sync.push(content);
        true
    }

    pub async fn accept(&mut self, id: &str) -> bool {
        self.apply(Action::Accept(id.to_owned())).await
    }

    pub async fn reject(&mut self, id: &str) -> bool {
        self.apply(Action::Reject(id.to_owned())).await
    }

    pub async fn undo(&mut self, id: &str) -> bool {
        self.apply(Action::Undo(id.to_owned())).await
    }

    pub async fn accept_all(&mut self) -> bool {
        self.apply(Action::AcceptAll).await
    }

    pub async fn reject_all(&mut self) -> bool {
        self.apply(Action::RejectAll).await
    }

    pub async fn undo_all(&mut self) -> bool {
        self.apply(Action::UndoAll).await
    }

    pub fn live_content(&self) -> String {
        live_lines(&self.segments, &self.state).join("\n")
    }

    pub fn preview_content(&self) -> String {
        reconstruct(&self.segments, &self.state, Mode::Preview)
    }

    pub fn download_content(&self, resolver: &dyn PlaceholderResolver) -> String {
        reconstruct(&self.segments, &self.state, Mode::Download(resolver))
    }

    pub fn preview_lines(&self) -> Vec<PreviewLine> {
        preview_lines(&self.segments, &self.state)
    }

    pub fn line_diff_map(&self) -> BTreeMap<usize, LineKind> {
        line_diff_map(&self.segments, &self.state)
    }

    pub fn block_line_ranges(&self) -> Vec<BlockRange> {
        block_line_ranges(&self.segments, &self.state)
    }

    pub fn stats(&self) -> ReviewStats {
        review_stats(&self.segments, &self.state)
    }

    /// What to show when asked for "the file": the last content the remote
    /// store confirmed, or the live reconstruction before any push landed.
    pub fn display_content(&self) -> String {
        self.sync
            .current_content()
            .unwrap_or_else(|| self.live_content())
    }

    /// Waits for the last push to finish.
    pub async fn settle(&mut self) {
        self.sync.settle().await;
    }
}

/// Fetches the original text of `path`, mapping the outcome to a
/// [`LoadState`] for display.
///
/// Returns the text only when the state is [`LoadState::Ready`]. A cancelled
/// fetch leaves the state at `Loading` with no text. `on_state` sees each
/// [`LoadState::Retrying`] as it happens.
pub async fn fetch_original<R, F>(
    remote: &R,
    conversation_id: &str,
    path: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut on_state: F,
) -> (LoadState, Option<String>)
where
    R: RemoteStore,
    F: FnMut(LoadState),
{
    let result = fetch_with_retry(remote, conversation_id, path, policy, cancel, |attempt| {
        tracing::info!(path, attempt, "file not available yet, retrying");
        on_state(LoadState::Retrying { attempt });
    })
    .await;

    match result {
        Ok(FetchedFile::Text(text)) => (LoadState::Ready, Some(text)),
        Ok(FetchedFile::Binary {
            download_url,
            filename,
        }) => (
            LoadState::Binary {
                download_url,
                filename,
            },
            None,
        ),
        Err(RemoteError::Cancelled) => (LoadState::Loading, None),
        Err(e) => {
            tracing::warn!(path, error = %e, "failed to load file");
            (LoadState::Failed(format!("Failed to load file: {e}")), None)
        }
    }
}
