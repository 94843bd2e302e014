//! redline: review a proposed rewrite of a file block by block.
//!
//! Entry point for the `redline` binary. Wires together the terminal
//! lifecycle (`tui`), unified event bus (`event`), rendering (`ui`), theme
//! system (`theme`), the filesystem remote store (`fs_remote`) and the
//! review engine and decision database (`redline-core`).
//!
//! # Startup sequence
//!
//! 1. Parse flags, load config, start file logging.
//! 2. Read the proposed file and open the decision database. Failures here
//!    are reported on a normal terminal.
//! 3. `install_panic_hook()` so a panic restores the terminal first.
//! 4. `register_sigterm()`, polled in the event loop.
//! 5. `init_tui()`, then start the event task and the original-file fetch.
//!
//! `restore_tui()` runs after the event loop returns, whatever it returned.

mod app;
mod cli;
mod config;
mod event;
mod fs_remote;
mod logging;
mod media;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use redline_core::db;
use redline_core::session::fetch_original;
use redline_core::{
    DecisionKey, DecisionStore, LoadState, NoPlaceholders, RetryPolicy, ReviewSession, SqliteKv,
    SyncController,
};
use tokio::sync::mpsc;
use tokio_rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use crate::app::{AppState, SyncStatus};
use crate::event::AppEvent;
use crate::fs_remote::FsRemote;
use crate::media::MediaPlaceholders;
use crate::ui::keybindings::{self, KeyAction};

type Session = ReviewSession<FsRemote, SqliteKv>;

/// Everything needed to open the session once the original arrives.
struct Review {
    conn: Connection,
    remote: Arc<FsRemote>,
    conversation_id: String,
    tool: String,
    /// The original's path as given on the command line; keys decisions.
    target: String,
    proposed: String,
    context_lines: usize,
    export_path: PathBuf,
    media: MediaPlaceholders,
}

impl Review {
    async fn open_session(
        &self,
        original: String,
        tx: &mpsc::UnboundedSender<AppEvent>,
    ) -> Session {
        let key = DecisionKey::new(&self.conversation_id, &self.tool, &self.target);
        let store = DecisionStore::new(SqliteKv::new(self.conn.clone()), key);

        let (sync_tx, sync_rx) = mpsc::unbounded_channel();
        event::forward_sync_events(sync_rx, tx.clone());
        let sync = SyncController::new(
            Arc::clone(&self.remote),
            &self.conversation_id,
            &self.target,
        )
        .with_events(sync_tx);

        ReviewSession::open(original, self.proposed.clone(), self.context_lines, store, sync).await
    }

    async fn export(&self, session: &Session) -> String {
        let content = if media::is_markdown(Path::new(&self.target)) {
            session.download_content(&self.media)
        } else {
            session.download_content(&NoPlaceholders)
        };
        match tokio::fs::write(&self.export_path, content).await {
            Ok(()) => {
                tracing::info!(path = %self.export_path.display(), "exported");
                format!("exported to {}", self.export_path.display())
            }
            Err(e) => {
                tracing::warn!(path = %self.export_path.display(), error = %e, "export failed");
                format!("export failed: {e}")
            }
        }
    }
}

fn spawn_fetch(
    remote: Arc<FsRemote>,
    conversation_id: String,
    path: String,
    policy: RetryPolicy,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let progress = tx.clone();
        let report = |state: LoadState| {
            let _ = progress.send(AppEvent::Load { state, text: None });
        };
        let (state, text) =
            fetch_original(&*remote, &conversation_id, &path, policy, &cancel, report).await;
        let _ = tx.send(AppEvent::Load { state, text });
    });
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = cli::Cli::parse();
    let (mut config, config_warning) = config::load(&config::config_path());
    config.apply_cli(&cli);

    std::fs::create_dir_all(&config.log_dir)?;
    let _log_guard = logging::init(&config.log_dir);
    if let Some(warning) = config_warning {
        tracing::warn!("{warning}");
    }

    let proposed = tokio::fs::read_to_string(&cli.proposed).await?;
    let target = cli.original.to_string_lossy().into_owned();

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_db(&config.db_path.to_string_lossy())
        .await
        .map_err(std::io::Error::other)?;
    let record = db::detect_or_create_session(&conn, &target, &cli.tool)
        .await
        .map_err(std::io::Error::other)?;
    let conversation_id = cli.conversation.clone().unwrap_or_else(|| record.id.clone());
    tracing::info!(
        session = %record.id,
        conversation = %conversation_id,
        original = %target,
        proposed = %cli.proposed.display(),
        "starting review"
    );

    let review = Review {
        conn: conn.clone(),
        remote: Arc::new(FsRemote::new(cli.output_path())),
        conversation_id,
        tool: cli.tool.clone(),
        target,
        proposed,
        context_lines: config.context_lines,
        export_path: cli.export_path(),
        media: MediaPlaceholders::new(config.media.clone()).map_err(std::io::Error::other)?,
    };
    let theme = theme::Theme::from_name(&config.theme);
    let title = cli
        .original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| review.target.clone());
    let mut state = AppState::new(title);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());

    let cancel = CancellationToken::new();
    spawn_fetch(
        Arc::clone(&review.remote),
        review.conversation_id.clone(),
        review.target.clone(),
        config.retry.policy(),
        cancel.clone(),
        handler.tx.clone(),
    );

    let mut session = None;
    let outcome = run(
        &mut terminal,
        handler,
        &review,
        &mut session,
        &mut state,
        &theme,
        &term_flag,
    )
    .await;

    cancel.cancel();
    if let Some(session) = session.as_mut() {
        finish(session).await;
    }
    tui::restore_tui()?;

    if let Err(e) = db::update_session_timestamp(&conn, &record.id).await {
        tracing::warn!(error = %e, "failed to update session timestamp");
    }
    if let Some(session) = &session {
        let stats = session.stats();
        println!(
            "{}: {} accepted, {} rejected, {} pending -> {}",
            review.target,
            stats.accepted,
            stats.rejected,
            stats.pending,
            review.remote.output().display()
        );
    }
    outcome
}

/// Makes sure the output file holds the final review, then waits for the
/// write to land.
async fn finish(session: &mut Session) {
    if session.sync().latest_generation() == 0 {
        let content = session.live_content();
        session.sync_mut().push(content);
    }
    session.settle().await;
}

/// The event loop. Returns on quit, SIGTERM, channel close or a draw error.
async fn run(
    terminal: &mut tui::Tui,
    handler: event::EventHandler,
    review: &Review,
    session: &mut Option<Session>,
    state: &mut AppState,
    theme: &theme::Theme,
    term_flag: &AtomicBool,
) -> std::io::Result<()> {
    let tx = handler.tx;
    let mut rx = handler.rx;

    loop {
        tokio::select! {
            // Heartbeat: checks SIGTERM at least every 50ms even when no
            // events arrive.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    return Ok(());
                };
                match event {
                    AppEvent::Render => {
                        terminal.draw(|frame| ui::render(frame, state, theme))?;
                    }
                    AppEvent::Tick => {
                        state.spinner = state.spinner.wrapping_add(1);
                    }
                    AppEvent::Key(key) => match keybindings::handle_key(key, state) {
                        KeyAction::Continue => {}
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Decide(action) => {
                            if let Some(session) = session.as_mut() {
                                if session.apply(action).await {
                                    state.sync = SyncStatus::Syncing;
                                }
                                state.refresh(session);
                            }
                        }
                        KeyAction::Export => {
                            if let Some(session) = session.as_ref() {
                                state.notice = Some(review.export(session).await);
                            }
                        }
                    },
                    AppEvent::Mouse(mouse) => keybindings::handle_mouse(mouse, state),
                    AppEvent::Resize(_, _) => {}
                    AppEvent::Load { state: load, text } => {
                        state.load = load;
                        if let Some(original) = text {
                            let opened = review.open_session(original, &tx).await;
                            state.refresh(&opened);
                            state.reveal_focused_block();
                            if state.ranges.is_empty() {
                                state.notice = Some("no changes".to_owned());
                            }
                            *session = Some(opened);
                        }
                    }
                    AppEvent::Sync(sync_event) => {
                        if let Some(session) = session.as_ref() {
                            state.on_sync_event(&sync_event, session.sync().latest_generation());
                        }
                    }
                }
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            tracing::info!("SIGTERM received");
            return Ok(());
        }
    }
}
