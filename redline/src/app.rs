//! Central application state.
//!
//! Pure state read by the render module and mutated by the keybinding
//! dispatcher and the event loop. The review itself lives in the session;
//! this struct holds a render-ready snapshot of it that is refreshed after
//! every decision.

use redline_core::reconstruct::{BlockRange, PreviewLine, ReviewStats};
use redline_core::{KeyValueStore, LoadState, RemoteStore, ReviewSession, SyncEvent};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Full-screen help overlay is shown above the review.
    HelpOverlay,
}

/// Where the last push of reviewed content stands.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing pushed yet this session.
    #[default]
    Idle,
    Syncing,
    Synced,
    Failed(String),
}

pub struct AppState {
    pub mode: Mode,
    pub load: LoadState,
    /// Display name of the file under review.
    pub title: String,

    /// Preview of the whole file under the current decisions.
    pub lines: Vec<PreviewLine>,
    /// 1-based preview line range of every change block, in file order.
    pub ranges: Vec<BlockRange>,
    pub stats: ReviewStats,
    pub additions: usize,
    pub deletions: usize,

    /// First visible preview line (0-based).
    pub scroll: usize,
    /// Inner height of the review panel, cached after each render.
    pub viewport_height: u16,
    pub help_scroll: u16,
    /// Index into `ranges` of the focused block.
    pub block_cursor: usize,

    pub sync: SyncStatus,
    /// One-shot message shown in the status bar until the next key.
    pub notice: Option<String>,
    /// Advances on every tick while loading.
    pub spinner: usize,
}

impl AppState {
    pub fn new(title: String) -> Self {
        Self {
            mode: Mode::default(),
            load: LoadState::Loading,
            title,
            lines: Vec::new(),
            ranges: Vec::new(),
            stats: ReviewStats::default(),
            additions: 0,
            deletions: 0,
            scroll: 0,
            viewport_height: 0,
            help_scroll: 0,
            block_cursor: 0,
            sync: SyncStatus::default(),
            notice: None,
            spinner: 0,
        }
    }

    /// Re-reads the preview, ranges and tally from `session`.
    pub fn refresh<R: RemoteStore, S: KeyValueStore>(&mut self, session: &ReviewSession<R, S>) {
        self.lines = session.preview_lines();
        self.ranges = session.block_line_ranges();
        self.stats = session.stats();
        self.additions = session.summary().additions;
        self.deletions = session.summary().deletions;
        self.block_cursor = self.block_cursor.min(self.ranges.len().saturating_sub(1));
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn focused_block(&self) -> Option<&BlockRange> {
        self.ranges.get(self.block_cursor)
    }

    pub fn focused_block_id(&self) -> Option<String> {
        self.focused_block().map(|r| r.id.clone())
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    /// Scrolls by half the visible height, or by one row before the first
    /// frame has cached a height.
    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport_height as usize / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport_height as usize / 2).max(1));
    }

    pub fn next_block(&mut self) {
        if self.ranges.is_empty() {
            return;
        }
        self.block_cursor = (self.block_cursor + 1).min(self.ranges.len() - 1);
        self.reveal_focused_block();
    }

    pub fn prev_block(&mut self) {
        if self.ranges.is_empty() {
            return;
        }
        self.block_cursor = self.block_cursor.saturating_sub(1);
        self.reveal_focused_block();
    }

    /// Scrolls so the focused block starts a third of the way down the view.
    pub fn reveal_focused_block(&mut self) {
        let Some(range) = self.focused_block() else {
            return;
        };
        let first = range.start.saturating_sub(1);
        let lead = self.viewport_height as usize / 3;
        self.scroll = first.saturating_sub(lead).min(self.max_scroll());
    }

    /// Folds a push outcome into the status. Only the newest generation
    /// counts; superseded pushes are ignored.
    pub fn on_sync_event(&mut self, event: &SyncEvent, latest_generation: u64) {
        match event {
            SyncEvent::Pushed { generation } if *generation == latest_generation => {
                self.sync = SyncStatus::Synced;
            }
            SyncEvent::Failed { generation, error } if *generation == latest_generation => {
                self.sync = SyncStatus::Failed(error.clone());
            }
            _ => {}
        }
    }
}
